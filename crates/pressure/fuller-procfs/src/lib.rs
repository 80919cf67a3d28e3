//! Procfs memory pressure reader.
//!
//! This crate reports the memory usage of the current process as read from
//! `/proc`, and reclaims by trimming the malloc heap.
//!
//! Implements the [`fuller_core::pressure::MemoryPressure`] trait.
//!
//! # Platform Requirements
//!
//! - Linux with procfs mounted at `/proc`
//! - Reclamation requires glibc (`malloc_trim`); elsewhere it is a no-op

#![warn(missing_docs)]

mod procfs;

pub use procfs::ProcPressure;
