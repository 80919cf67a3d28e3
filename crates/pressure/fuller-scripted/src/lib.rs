//! Scripted memory pressure reader.
//!
//! This crate replays a fixed sequence of readings. It makes reclamation
//! reports deterministic and is meant for tests and demonstrations.
//!
//! Implements the [`fuller_core::pressure::MemoryPressure`] trait.

#![warn(missing_docs)]

mod scripted;

pub use scripted::ScriptedPressure;
