//! # Fuller
//!
//! Fuller is a simulator for heap grooming and a builder and scorer for gadget
//! chains. It works purely on caller-supplied data: object sizes, gadget
//! addresses and memory pressure readings.
//!
//! This crate re-exports [`fuller_core`] and, behind features, the available
//! memory pressure readers:
//!
//! - `procfs`: [`ProcPressure`], reading the current process from `/proc`
//! - `scripted`: [`ScriptedPressure`], replaying fixed readings
//!
//! ## Quickstart
//!
//! ```
//! use fuller::layout::{GroomStrategy, HoleConfig, HoleStrategy, LayoutSimulator};
//! use fuller::pressure::NoPressure;
//! use fuller::util::Size;
//!
//! let mut sim = LayoutSimulator::new(NoPressure::default());
//! let group = sim.groom(Size::B(256), 10, GroomStrategy::Linear).unwrap();
//! let holes = sim
//!     .punch_holes(group.id, HoleStrategy::EveryOther, &HoleConfig::default())
//!     .unwrap();
//! assert_eq!(holes.total_holes, 5);
//! ```

pub use fuller_core::*;

#[cfg(feature = "procfs")]
pub use fuller_procfs::ProcPressure;
#[cfg(feature = "scripted")]
pub use fuller_scripted::ScriptedPressure;
