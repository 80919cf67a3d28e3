use crate::layout::{Slot, SlotShape};
use crate::pressure::PressureReading;
use crate::util::CORRUPTION_SIZE_LIMIT;
use itertools::Itertools;
use serde::Serialize;

/// Hole statistics of one allocation group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HoleAnalysis {
    /// Number of empty slots
    pub total_holes: usize,
    /// Longest run of consecutive empty slots
    pub max_consecutive: usize,
    /// `total_holes / len`, 0 for a group without slots
    pub fragmentation: f64,
}

impl HoleAnalysis {
    /// Computes hole statistics over a slot table.
    pub fn of(slots: &[Slot]) -> Self {
        let total_holes = slots.iter().filter(|slot| slot.is_empty()).count();
        let runs = slots.iter().chunk_by(|slot| slot.is_empty());
        let max_consecutive = (&runs)
            .into_iter()
            .filter_map(|(empty, run)| empty.then(|| run.count()))
            .max()
            .unwrap_or(0);
        let fragmentation = if slots.is_empty() {
            0.0
        } else {
            total_holes as f64 / slots.len() as f64
        };
        Self {
            total_holes,
            max_consecutive,
            fragmentation,
        }
    }
}

/// Pressure reading together with the simulator's own bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Bytes in use as reported by the pressure reader
    pub used: u64,
    /// Bytes reserved as reported by the pressure reader
    pub total: u64,
    /// Memory limit as reported by the pressure reader
    pub limit: u64,
    /// Bytes requested by all grooms and sprays still tracked
    pub allocated: usize,
}

impl MemoryStats {
    pub(crate) fn new(reading: PressureReading, allocated: usize) -> Self {
        Self {
            used: reading.used,
            total: reading.total,
            limit: reading.limit,
            allocated,
        }
    }
}

/// Result of a reclamation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReclaimReport {
    /// Stats before reclaiming
    pub before: MemoryStats,
    /// Stats after reclaiming
    pub after: MemoryStats,
    /// `before.used - after.used`, saturated to `i64`; negative if usage grew
    pub freed: i64,
    /// `freed` as a percentage of `before.used`, 0 if nothing was in use
    pub efficiency: f64,
}

impl ReclaimReport {
    pub(crate) fn new(before: MemoryStats, after: MemoryStats) -> Self {
        let delta = i128::from(before.used) - i128::from(after.used);
        let freed = delta.clamp(i64::MIN.into(), i64::MAX.into()) as i64;
        let efficiency = if before.used == 0 {
            0.0
        } else {
            delta as f64 / before.used as f64 * 100.0
        };
        Self {
            before,
            after,
            freed,
            efficiency,
        }
    }
}

/// How badly a group is corrupted, by number of corrupted slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing corrupted
    #[default]
    None,
    /// One corrupted slot
    Low,
    /// Two to five
    Medium,
    /// Six to ten
    High,
    /// More than ten
    Critical,
}

impl Severity {
    fn of(corrupted: usize) -> Self {
        match corrupted {
            0 => Severity::None,
            1 => Severity::Low,
            2..=5 => Severity::Medium,
            6..=10 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

/// Why a slot counts as corrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Corruption {
    /// The object has no bytes left
    ZeroSize,
    /// The object claims more than [`CORRUPTION_SIZE_LIMIT`] bytes
    SizeCorruption {
        /// The claimed size
        size: usize,
    },
}

/// An occupied slot whose object looks corrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CorruptedSlot {
    /// Index of the slot in its group
    pub index: usize,
    /// Kind of the occupying object
    pub shape: SlotShape,
    /// The detected corruption
    pub corruption: Corruption,
}

/// Recurring structure among corrupted slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptionPattern {
    /// At least two corrupted slots are adjacent
    Sequential,
}

/// Corruption found in one allocation group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorruptionReport {
    /// At least one slot is corrupted
    pub detected: bool,
    /// Corrupted slots in index order
    pub corrupted: Vec<CorruptedSlot>,
    /// Patterns among the corrupted slots
    pub patterns: Vec<CorruptionPattern>,
    /// Severity bucket of `corrupted.len()`
    pub severity: Severity,
}

impl CorruptionReport {
    /// Inspects a slot table. Holes are never corrupted.
    pub fn of(slots: &[Slot]) -> Self {
        let corrupted: Vec<CorruptedSlot> = slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let allocation = slot.allocation()?;
                let corruption = match allocation.size {
                    0 => Corruption::ZeroSize,
                    size if size > CORRUPTION_SIZE_LIMIT => Corruption::SizeCorruption { size },
                    _ => return None,
                };
                Some(CorruptedSlot {
                    index,
                    shape: allocation.shape,
                    corruption,
                })
            })
            .collect();
        let mut patterns = vec![];
        if corrupted.windows(2).any(|w| w[1].index == w[0].index + 1) {
            patterns.push(CorruptionPattern::Sequential);
        }
        Self {
            detected: !corrupted.is_empty(),
            severity: Severity::of(corrupted.len()),
            corrupted,
            patterns,
        }
    }
}

/// Summary over everything the simulator tracks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayoutOverview {
    /// Current stats
    pub stats: MemoryStats,
    /// Percentage of empty slots over all groups, 0 without slots
    pub fragmentation: f64,
    /// Number of tracked groups
    pub groups: usize,
    /// Number of tracked spray sets
    pub sprays: usize,
    /// `used / total` as a percentage, 0 if `total` is 0
    pub efficiency: f64,
}

/// Verdict on the overall layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayoutValidation {
    /// Memory is in use and fewer than half of all slots are holes
    pub valid: bool,
    /// The overview the verdict was derived from
    #[serde(flatten)]
    pub overview: LayoutOverview,
}
