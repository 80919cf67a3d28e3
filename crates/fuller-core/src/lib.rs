//! # Fuller Core
//!
//! `fuller-core` is the foundational library of Fuller, a bookkeeping engine
//! for heap grooming experiments and gadget chain assembly. It never touches
//! real process memory: every address, gadget and memory reading comes from the
//! caller.
//!
//! ## Architecture Overview
//!
//! The library consists of two independent halves joined only by the caller:
//!
//! - [`layout::LayoutSimulator`] - Grooms allocation groups, punches holes into
//!   them, sprays stamped buffers and reclaims memory. Memory usage is observed
//!   through the [`pressure::MemoryPressure`] trait.
//!
//! - [`chain::ChainSession`] - Builds gadget chains from a
//!   [`gadget::GadgetCatalog`] with [`chain::ChainBuilder`] and scores them
//!   with [`chain::validate`].
//!
//! ## Main Components
//!
//! - [`pattern`] module - Character patterns for buffer fills and offset
//!   lookup, plus the index patterns used for hole punching.
//!
//! - [`pressure`] module - The [`pressure::MemoryPressure`] trait. Implementations
//!   live in separate crates such as `fuller-procfs` and `fuller-scripted`.
//!
//! - [`util`] module - Contains utility types and functions including [`util::Size`]
//!   for object sizes, address packing and a seedable [`util::Rng`].

#![warn(missing_docs)]

pub mod chain;
pub mod gadget;
pub mod layout;
pub mod pattern;
pub mod pressure;
pub mod util;
