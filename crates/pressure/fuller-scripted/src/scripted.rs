use fuller_core::pressure::{MemoryPressure, PressureReading};
use log::{debug, warn};
use std::collections::VecDeque;

/// Reader returning readings from a script.
///
/// Every [`read()`](MemoryPressure::read) pops the next reading. Once the
/// script is exhausted, the last reading is repeated. An empty script reads
/// as zeros.
///
/// Collections always succeed and are counted. When `collect_advances` is
/// set, a collection also skips to the next reading, modelling memory that is
/// released by the collection itself.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPressure {
    script: VecDeque<PressureReading>,
    last: PressureReading,
    collections: usize,
    collect_advances: bool,
}

impl ScriptedPressure {
    /// Creates a reader replaying `readings` in order.
    pub fn new(readings: impl IntoIterator<Item = PressureReading>) -> Self {
        Self {
            script: readings.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Creates a reader replaying `used` values with fixed `total` and `limit`.
    pub fn from_used(used: &[u64], total: u64, limit: u64) -> Self {
        Self::new(used.iter().map(|&used| PressureReading { used, total, limit }))
    }

    /// Makes every collection consume one reading.
    pub fn collect_advances(mut self) -> Self {
        self.collect_advances = true;
        self
    }

    /// Number of collections requested so far.
    pub fn collections(&self) -> usize {
        self.collections
    }

    /// Number of readings left in the script.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn advance(&mut self) -> PressureReading {
        match self.script.pop_front() {
            Some(reading) => self.last = reading,
            None => warn!("Pressure script exhausted, repeating last reading"),
        }
        self.last
    }
}

impl MemoryPressure for ScriptedPressure {
    fn read(&mut self) -> PressureReading {
        let reading = self.advance();
        debug!("Scripted reading: {:?}", reading);
        reading
    }

    fn collect(&mut self) -> bool {
        self.collections += 1;
        if self.collect_advances {
            self.advance();
        }
        true
    }
}
