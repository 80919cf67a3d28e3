//! Memory pressure readings.
//!
//! This module defines the [`MemoryPressure`] trait through which the layout
//! simulator observes the memory usage of its host. The simulator never derives
//! these numbers itself; it records whatever the reader reports before and after
//! a reclamation.

use crate::util::DEFAULT_MEMORY_LIMIT;
use serde::{Deserialize, Serialize};

/// One instantaneous memory usage reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureReading {
    /// Bytes currently in use
    pub used: u64,
    /// Bytes currently reserved by the host
    pub total: u64,
    /// Upper bound the host may grow to
    pub limit: u64,
}

/// Trait for sources of memory pressure readings.
///
/// Implementors report the memory usage of some host, e.g. the current process
/// (`fuller-procfs`) or a scripted sequence of values (`fuller-scripted`).
///
/// # Required Methods
///
/// * [`read()`](MemoryPressure::read) - Returns the current reading
///
/// # Provided Methods
///
/// * [`collect()`](MemoryPressure::collect) - Asks the host to reclaim memory
pub trait MemoryPressure {
    /// Returns the current memory usage.
    ///
    /// Readings are opaque to the caller. A reader that cannot observe its host
    /// should report zeros rather than fail.
    fn read(&mut self) -> PressureReading;

    /// Asks the host to reclaim unused memory.
    ///
    /// Returns `true` if the host performed a reclamation. The default
    /// implementation cannot reclaim and returns `false`, in which case the
    /// simulator falls back to churning transient allocations.
    fn collect(&mut self) -> bool {
        false
    }
}

impl<P: MemoryPressure + ?Sized> MemoryPressure for Box<P> {
    fn read(&mut self) -> PressureReading {
        (**self).read()
    }

    fn collect(&mut self) -> bool {
        (**self).collect()
    }
}

/// Reader for hosts that expose no usage information.
///
/// Always reports zero usage and a fixed limit.
#[derive(Clone, Copy, Debug)]
pub struct NoPressure {
    limit: u64,
}

impl NoPressure {
    /// Creates a reader reporting `limit` as the memory limit.
    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }
}

impl Default for NoPressure {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MEMORY_LIMIT)
    }
}

impl MemoryPressure for NoPressure {
    fn read(&mut self) -> PressureReading {
        PressureReading {
            used: 0,
            total: 0,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pressure_reports_limit() {
        let mut reader = NoPressure::default();
        let reading = reader.read();
        assert_eq!(reading.used, 0);
        assert_eq!(reading.limit, DEFAULT_MEMORY_LIMIT);
        assert!(!reader.collect());
    }

    #[test]
    fn test_boxed_reader() {
        let mut reader: Box<dyn MemoryPressure> = Box::new(NoPressure::with_limit(42));
        assert_eq!(reader.read().limit, 42);
    }
}
