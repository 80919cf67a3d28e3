//! The `layout` module simulates heap grooming.
//!
//! The `layout` module provides the following abstractions:
//! - `LayoutSimulator`: Owns allocation groups and spray sets and reports memory usage
//!   through a [`MemoryPressure`](crate::pressure::MemoryPressure) reader.
//! - `AllocationGroup`: A fixed-size table of slots created by one groom.
//! - `SpraySet`: An immutable set of buffers stamped with a 32-bit pattern.
//!
//! Grooming, hole punching and reclamation are driven by the strategy enums
//! `GroomStrategy`, `HoleStrategy` and `ReclaimMode`.
mod analysis;
mod group;
mod simulator;
mod slot;
mod spray;
mod strategy;

pub use self::analysis::{
    CorruptedSlot, Corruption, CorruptionPattern, CorruptionReport, HoleAnalysis, LayoutOverview,
    LayoutValidation, MemoryStats, ReclaimReport, Severity,
};
pub use self::group::{AllocationGroup, GroupId};
pub use self::simulator::{GroomOutcome, LayoutSimulator, SprayOutcome};
pub use self::slot::{Allocation, Slot, SlotShape};
pub use self::spray::{Distribution, Encoding, SprayConfig, SprayId, SpraySet};
pub use self::strategy::{GroomStrategy, HoleConfig, HoleStrategy, ReclaimMode};

use thiserror::Error;

/// Errors raised by the layout simulator.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A strategy name could not be parsed.
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),
    /// No allocation group with this id is tracked.
    #[error("Unknown group: {0}")]
    UnknownGroupId(GroupId),
    /// No spray set with this id is tracked.
    #[error("Unknown spray set: {0}")]
    UnknownSprayId(SprayId),
    /// A size or count was out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
