use crate::layout::{
    AllocationGroup, CorruptionReport, GroomStrategy, GroupId, HoleAnalysis, HoleConfig, HoleStrategy,
    LayoutError, LayoutOverview, LayoutValidation, MemoryStats, ReclaimMode, ReclaimReport, Slot,
    SprayConfig, SprayId, SpraySet,
};
use crate::pressure::MemoryPressure;
use crate::util::{
    AGGRESSIVE_ATTEMPTS, NamedProgress, STRESS_OBJECT_SIZE, STRESS_OBJECTS, STRESS_ROUNDS, Size,
    make_vec,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::hint::black_box;

/// Words churned by a gentle reclamation attempt
const GENTLE_CHURN: usize = 1_000;
/// Words churned by each aggressive reclamation attempt
const AGGRESSIVE_CHURN: usize = 10_000;
/// Stress rounds between two explicit collections
const STRESS_COLLECT_INTERVAL: usize = 10;

/// Result of [`LayoutSimulator::groom`].
#[derive(Clone, Debug, Serialize)]
pub struct GroomOutcome {
    /// Identifier of the new group
    pub id: GroupId,
    /// Snapshot of the new group's slots
    pub layout: Vec<Slot>,
    /// Stats after grooming
    pub stats: MemoryStats,
}

/// Result of [`LayoutSimulator::spray`].
#[derive(Clone, Debug, Serialize)]
pub struct SprayOutcome {
    /// Identifier of the new spray set
    pub id: SprayId,
    /// Number of stamped buffers
    pub stamped: usize,
    /// Stats after spraying
    pub stats: MemoryStats,
}

/// Simulated heap layout manager.
///
/// The simulator owns a set of allocation groups and spray sets and the
/// [`MemoryPressure`] reader used to report memory usage. It emulates the
/// steps of allocator grooming:
///
/// 1. [`groom()`](LayoutSimulator::groom) fills a new group with objects
/// 2. [`punch_holes()`](LayoutSimulator::punch_holes) empties a subset of its slots
/// 3. [`analyze()`](LayoutSimulator::analyze) reports the resulting fragmentation
///
/// [`spray()`](LayoutSimulator::spray) and [`reclaim()`](LayoutSimulator::reclaim)
/// are independent of the groups.
///
/// All mutation goes through `&mut self`. Share a simulator between threads by
/// wrapping it in a `Mutex`.
pub struct LayoutSimulator<P: MemoryPressure> {
    groups: BTreeMap<GroupId, AllocationGroup>,
    sprays: BTreeMap<SprayId, SpraySet>,
    next_id: u64,
    allocated: usize,
    pressure: P,
    progress: Option<MultiProgress>,
}

impl<P: MemoryPressure> LayoutSimulator<P> {
    /// Creates an empty simulator reading memory usage from `pressure`.
    pub fn new(pressure: P) -> Self {
        Self {
            groups: BTreeMap::new(),
            sprays: BTreeMap::new(),
            next_id: 0,
            allocated: 0,
            pressure,
            progress: None,
        }
    }

    /// Shows progress bars for long-running operations.
    pub fn progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The pressure reader.
    pub fn pressure(&self) -> &P {
        &self.pressure
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn named_bar(&self, name: &str, len: usize) -> Option<ProgressBar> {
        self.progress.as_ref().map(|p| {
            let bar = p.add(ProgressBar::new(len as u64));
            bar.set_style(ProgressStyle::named_bar(name));
            bar
        })
    }

    /// Current stats.
    pub fn stats(&mut self) -> MemoryStats {
        MemoryStats::new(self.pressure.read(), self.allocated)
    }

    /// Fills a new allocation group with `count` objects of nominal size `size`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidInput`] if `size` or `count` is zero, or if
    /// the requested bytes or any slot size overflow a `usize`.
    pub fn groom(
        &mut self,
        size: Size,
        count: usize,
        strategy: GroomStrategy,
    ) -> Result<GroomOutcome, LayoutError> {
        if size.bytes() == 0 || count == 0 {
            return Err(LayoutError::InvalidInput(format!(
                "cannot groom {} objects of {}",
                count, size
            )));
        }
        info!(
            "Grooming {} objects of {} using {} strategy",
            count, size, strategy
        );
        let requested = size.bytes().checked_mul(count).ok_or_else(|| {
            LayoutError::InvalidInput(format!("{} objects of {} overflow", count, size))
        })?;
        let slots = strategy.layout(size, count)?;
        let id = GroupId(self.next_id());
        let layout = slots.clone();
        self.groups
            .insert(id, AllocationGroup::new(id, slots, requested));
        self.allocated = self.allocated.saturating_add(requested);
        debug!("Created group {} with {} slots", id, count);
        Ok(GroomOutcome {
            id,
            layout,
            stats: self.stats(),
        })
    }

    /// Empties slots of group `id` selected by `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownGroupId`] if no group `id` is tracked.
    pub fn punch_holes(
        &mut self,
        id: GroupId,
        strategy: HoleStrategy,
        config: &HoleConfig,
    ) -> Result<HoleAnalysis, LayoutError> {
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(LayoutError::UnknownGroupId(id))?;
        info!("Punching holes into {} using {} strategy", id, strategy);
        let indices = strategy.indices(group.len(), config);
        let punched = group.punch(&indices);
        debug!("Emptied {} slots of {}", punched, id);
        Ok(HoleAnalysis::of(group.slots()))
    }

    /// Reports hole statistics of group `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownGroupId`] if no group `id` is tracked.
    pub fn analyze(&self, id: GroupId) -> Result<HoleAnalysis, LayoutError> {
        self.groups
            .get(&id)
            .map(|group| HoleAnalysis::of(group.slots()))
            .ok_or(LayoutError::UnknownGroupId(id))
    }

    /// Reports occupied slots of group `id` whose objects have a corrupted size.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownGroupId`] if no group `id` is tracked.
    pub fn detect_corruption(&self, id: GroupId) -> Result<CorruptionReport, LayoutError> {
        let group = self.groups.get(&id).ok_or(LayoutError::UnknownGroupId(id))?;
        info!("Analyzing {} for corruption", id);
        let report = CorruptionReport::of(group.slots());
        if report.detected {
            warn!(
                "{} corrupted slots in {} ({:?})",
                report.corrupted.len(),
                id,
                report.severity
            );
        }
        Ok(report)
    }

    /// Tries to reduce memory pressure and reports usage before and after.
    pub fn reclaim(&mut self, mode: ReclaimMode) -> ReclaimReport {
        info!("Reclaiming memory ({:?})", mode);
        let before = self.stats();
        match mode {
            ReclaimMode::Gentle => self.attempt(GENTLE_CHURN),
            ReclaimMode::Aggressive => {
                for _ in 0..AGGRESSIVE_ATTEMPTS {
                    self.attempt(AGGRESSIVE_CHURN);
                }
            }
            ReclaimMode::Targeted => {
                for group in self.groups.values_mut() {
                    group.clear();
                }
                self.attempt(GENTLE_CHURN);
            }
            ReclaimMode::Stress => self.stress(),
        }
        let after = self.stats();
        let report = ReclaimReport::new(before, after);
        debug!("Reclaimed {} bytes", report.freed);
        report
    }

    /// One reclamation attempt. Falls back to churning `words` transient words
    /// when the host cannot collect.
    fn attempt(&mut self, words: usize) {
        if !self.pressure.collect() {
            let churn = vec![0x5A5A_5A5Au32; words];
            black_box(&churn);
        }
    }

    fn stress(&mut self) {
        let bar = self.named_bar("Stress rounds", STRESS_ROUNDS);
        for round in 0..STRESS_ROUNDS {
            let objects = make_vec(STRESS_OBJECTS, |_| vec![0u8; STRESS_OBJECT_SIZE]);
            black_box(&objects);
            drop(objects);
            if round % STRESS_COLLECT_INTERVAL == 0 {
                self.pressure.collect();
            }
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }

    /// Creates a new spray set.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidInput`] if the slot size is not a positive
    /// multiple of 4 bytes or the count is zero.
    pub fn spray(&mut self, config: &SprayConfig) -> Result<SprayOutcome, LayoutError> {
        info!(
            "Spraying {} objects of {} ({:?}, {:?})",
            config.count, config.slot_size, config.distribution, config.encoding
        );
        let bar = self.named_bar("Spraying", config.count);
        let id = SprayId(self.next_id());
        let set = SpraySet::build(id, config, bar.as_ref())?;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let stamped = set.stamped();
        self.sprays.insert(id, set);
        self.allocated = self
            .allocated
            .saturating_add(config.slot_size.bytes().saturating_mul(config.count));
        Ok(SprayOutcome {
            id,
            stamped,
            stats: self.stats(),
        })
    }

    /// Returns group `id`, if tracked.
    pub fn group(&self, id: GroupId) -> Option<&AllocationGroup> {
        self.groups.get(&id)
    }

    /// Returns spray set `id`, if tracked.
    pub fn spray_set(&self, id: SprayId) -> Option<&SpraySet> {
        self.sprays.get(&id)
    }

    /// Stops tracking group `id` and hands it back.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownGroupId`] if no group `id` is tracked.
    pub fn release_group(&mut self, id: GroupId) -> Result<AllocationGroup, LayoutError> {
        let group = self
            .groups
            .remove(&id)
            .ok_or(LayoutError::UnknownGroupId(id))?;
        self.allocated = self.allocated.saturating_sub(group.requested());
        debug!("Released group {}", id);
        Ok(group)
    }

    /// Stops tracking spray set `id` and hands it back.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownSprayId`] if no spray set `id` is tracked.
    pub fn release_spray(&mut self, id: SprayId) -> Result<SpraySet, LayoutError> {
        let set = self
            .sprays
            .remove(&id)
            .ok_or(LayoutError::UnknownSprayId(id))?;
        self.allocated = self
            .allocated
            .saturating_sub(set.slot_size().saturating_mul(set.len()));
        debug!("Released spray set {}", id);
        Ok(set)
    }

    /// Drops every group and spray set, then reclaims aggressively.
    pub fn cleanup(&mut self) -> MemoryStats {
        info!(
            "Cleaning up {} groups and {} spray sets",
            self.groups.len(),
            self.sprays.len()
        );
        self.groups.clear();
        self.sprays.clear();
        self.allocated = 0;
        self.reclaim(ReclaimMode::Aggressive);
        self.stats()
    }

    /// Summarizes everything the simulator tracks.
    pub fn overview(&mut self) -> LayoutOverview {
        let stats = self.stats();
        let (slots, holes) = self.groups.values().fold((0, 0), |(slots, holes), group| {
            let analysis = HoleAnalysis::of(group.slots());
            (slots + group.len(), holes + analysis.total_holes)
        });
        let fragmentation = if slots > 0 {
            holes as f64 / slots as f64 * 100.0
        } else {
            0.0
        };
        let efficiency = if stats.total > 0 {
            stats.used as f64 / stats.total as f64 * 100.0
        } else {
            0.0
        };
        LayoutOverview {
            stats,
            fragmentation,
            groups: self.groups.len(),
            sprays: self.sprays.len(),
            efficiency,
        }
    }

    /// Checks that memory is in use and fewer than half of all slots are holes.
    pub fn validate(&mut self) -> LayoutValidation {
        let overview = self.overview();
        let valid = overview.stats.used > 0 && overview.fragmentation < 50.0;
        if !valid {
            warn!(
                "Layout invalid: {} bytes used, {:.1}% fragmentation",
                overview.stats.used, overview.fragmentation
            );
        }
        LayoutValidation { valid, overview }
    }
}
