use crate::layout::{Allocation, LayoutError, Slot, SlotShape};
use crate::pattern::{fibonacci_indices, prime_indices};
use crate::util::{GRADUAL_INTERVAL, LINEAR_FILL, SLOT_ALIGNMENT, SMALL_OBJECT_LIMIT, Size, make_vec};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fill of the array slots of controlled grooming
const CONTROLLED_ARRAY_FILL: u32 = 0xAAAA_AAAA;
/// Fill of the word slots of controlled grooming
const CONTROLLED_WORDS_FILL: u32 = 0xBBBB_BBBB;

/// Strategy used to fill a new allocation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroomStrategy {
    /// Same-size objects with an incrementing stamp
    Linear,
    /// Four object shapes interleaved round-robin
    Controlled,
    /// Sizes cycling through half, one, two and four times the base size
    Fragmented,
    /// Sizes rounded up to a 16-byte boundary
    Aligned,
}

impl GroomStrategy {
    /// Builds the slots of a group of `count` objects of nominal size `size`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidInput`] if a slot size derived from
    /// `size` does not fit into a `usize`.
    pub fn layout(&self, size: Size, count: usize) -> Result<Vec<Slot>, LayoutError> {
        let bytes = size.bytes();
        let overflow = || {
            LayoutError::InvalidInput(format!("{} objects of {} overflow", self, size))
        };
        Ok(match self {
            GroomStrategy::Linear => make_vec(count, |i| {
                let shape = if bytes < SMALL_OBJECT_LIMIT {
                    SlotShape::Array
                } else {
                    SlotShape::Buffer
                };
                Allocation::new(bytes, LINEAR_FILL.wrapping_add(i as u32), shape).into()
            }),
            GroomStrategy::Controlled => make_vec(count, |i| {
                let (shape, fill) = match i % 4 {
                    0 => (SlotShape::Array, CONTROLLED_ARRAY_FILL),
                    1 => (SlotShape::Words, CONTROLLED_WORDS_FILL),
                    2 => (SlotShape::Floats, (1.1f64.to_bits() >> 32) as u32),
                    _ => (SlotShape::Record, 0),
                };
                Allocation::new(bytes, fill, shape).into()
            }),
            GroomStrategy::Fragmented => {
                let largest = bytes.checked_mul(4).ok_or_else(overflow)?;
                let sizes = [bytes / 2, bytes, bytes * 2, largest];
                make_vec(count, |i| {
                    Allocation::new(sizes[i % sizes.len()], 0, SlotShape::Buffer).into()
                })
            }
            GroomStrategy::Aligned => {
                let aligned = size.align_up(SLOT_ALIGNMENT).ok_or_else(overflow)?;
                make_vec(count, |_| Allocation::new(aligned, 0, SlotShape::Buffer).into())
            }
        })
    }
}

impl FromStr for GroomStrategy {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(GroomStrategy::Linear),
            "controlled" => Ok(GroomStrategy::Controlled),
            "fragmented" => Ok(GroomStrategy::Fragmented),
            "aligned" => Ok(GroomStrategy::Aligned),
            _ => Err(LayoutError::InvalidStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for GroomStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroomStrategy::Linear => "linear",
            GroomStrategy::Controlled => "controlled",
            GroomStrategy::Fragmented => "fragmented",
            GroomStrategy::Aligned => "aligned",
        };
        write!(f, "{}", s)
    }
}

/// Strategy used to punch holes into an existing group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleStrategy {
    /// Empty every odd-indexed slot
    EveryOther,
    /// Empty slots at Fibonacci indices
    Fibonacci,
    /// Empty slots at prime indices
    Prime,
    /// Empty exactly the slots listed in [`HoleConfig::pattern`]
    Custom,
    /// Empty slots with a growing stride of [`HoleConfig::interval`]
    Gradual,
}

/// Parameters of the hole strategies that take any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoleConfig {
    /// Slot indices emptied by [`HoleStrategy::Custom`]
    pub pattern: Vec<usize>,
    /// Stride increment of [`HoleStrategy::Gradual`]; 0 selects the default
    pub interval: usize,
}

impl Default for HoleConfig {
    fn default() -> Self {
        Self {
            pattern: vec![],
            interval: GRADUAL_INTERVAL,
        }
    }
}

impl HoleStrategy {
    /// Returns the indices to empty in a group of `len` slots.
    ///
    /// Every returned index is `< len`. Indices may repeat.
    pub fn indices(&self, len: usize, config: &HoleConfig) -> Vec<usize> {
        match self {
            HoleStrategy::EveryOther => (1..len).step_by(2).collect(),
            HoleStrategy::Fibonacci => fibonacci_indices(len),
            HoleStrategy::Prime => prime_indices(len),
            HoleStrategy::Custom => config.pattern.iter().copied().filter(|&i| i < len).collect(),
            HoleStrategy::Gradual => {
                let interval = match config.interval {
                    0 => GRADUAL_INTERVAL,
                    interval => interval,
                };
                let mut indices = vec![];
                let mut step: usize = 1;
                let mut i = 0;
                while i < len {
                    indices.push(i);
                    step = step.saturating_add(interval).min(len - i);
                    i += step;
                }
                indices
            }
        }
    }
}

impl FromStr for HoleStrategy {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "every_other" => Ok(HoleStrategy::EveryOther),
            "fibonacci" => Ok(HoleStrategy::Fibonacci),
            "prime" => Ok(HoleStrategy::Prime),
            "custom" => Ok(HoleStrategy::Custom),
            "gradual" => Ok(HoleStrategy::Gradual),
            _ => Err(LayoutError::InvalidStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for HoleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HoleStrategy::EveryOther => "every_other",
            HoleStrategy::Fibonacci => "fibonacci",
            HoleStrategy::Prime => "prime",
            HoleStrategy::Custom => "custom",
            HoleStrategy::Gradual => "gradual",
        };
        write!(f, "{}", s)
    }
}

/// How hard [`LayoutSimulator::reclaim`](crate::layout::LayoutSimulator::reclaim) works.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReclaimMode {
    /// One low-effort attempt
    Gentle,
    /// Repeated attempts
    #[default]
    Aggressive,
    /// Empty every tracked group, then one attempt
    Targeted,
    /// Bounded churn of transient allocations
    Stress,
}

impl FromStr for ReclaimMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gentle" => Ok(ReclaimMode::Gentle),
            "aggressive" => Ok(ReclaimMode::Aggressive),
            "targeted" => Ok(ReclaimMode::Targeted),
            "stress" => Ok(ReclaimMode::Stress),
            _ => Err(LayoutError::InvalidStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_stamps_increment() {
        let slots = GroomStrategy::Linear.layout(Size::B(256), 3).unwrap();
        let fills: Vec<u32> = slots.iter().map(|s| s.allocation().unwrap().fill).collect();
        assert_eq!(fills, vec![0x41414141, 0x41414142, 0x41414143]);
        assert_eq!(slots[0].allocation().unwrap().shape, SlotShape::Buffer);
        let small = GroomStrategy::Linear.layout(Size::B(0x80), 1).unwrap();
        assert_eq!(small[0].allocation().unwrap().shape, SlotShape::Array);
    }

    #[test]
    fn test_controlled_cycles_shapes() {
        let slots = GroomStrategy::Controlled.layout(Size::B(64), 6).unwrap();
        let shapes: Vec<SlotShape> = slots.iter().map(|s| s.allocation().unwrap().shape).collect();
        assert_eq!(
            shapes,
            vec![
                SlotShape::Array,
                SlotShape::Words,
                SlotShape::Floats,
                SlotShape::Record,
                SlotShape::Array,
                SlotShape::Words
            ]
        );
        assert_eq!(slots[2].allocation().unwrap().fill, 0x3FF1_9999);
    }

    #[test]
    fn test_fragmented_sizes() {
        let slots = GroomStrategy::Fragmented.layout(Size::B(64), 5).unwrap();
        let sizes: Vec<usize> = slots.iter().map(Slot::size).collect();
        assert_eq!(sizes, vec![32, 64, 128, 256, 32]);
    }

    #[test]
    fn test_aligned_rounds_up() {
        let slots = GroomStrategy::Aligned.layout(Size::B(100), 2).unwrap();
        assert!(slots.iter().all(|s| s.size() == 112));
    }

    #[test]
    fn test_oversized_objects_are_rejected() {
        assert!(matches!(
            GroomStrategy::Fragmented.layout(Size::B(usize::MAX / 2), 1),
            Err(LayoutError::InvalidInput(_))
        ));
        assert!(matches!(
            GroomStrategy::Aligned.layout(Size::B(usize::MAX - 3), 1),
            Err(LayoutError::InvalidInput(_))
        ));
        assert_eq!(
            GroomStrategy::Linear.layout(Size::B(usize::MAX / 2), 1).unwrap()[0].size(),
            usize::MAX / 2
        );
    }

    #[test]
    fn test_unknown_strategies() {
        assert!(matches!(
            "diagonal".parse::<GroomStrategy>(),
            Err(LayoutError::InvalidStrategy(s)) if s == "diagonal"
        ));
        assert!("random".parse::<HoleStrategy>().is_err());
        assert!("lazy".parse::<ReclaimMode>().is_err());
    }

    #[test]
    fn test_strategy_tags_round_trip() {
        for tag in ["linear", "controlled", "fragmented", "aligned"] {
            assert_eq!(tag.parse::<GroomStrategy>().unwrap().to_string(), tag);
        }
        for tag in ["every_other", "fibonacci", "prime", "custom", "gradual"] {
            assert_eq!(tag.parse::<HoleStrategy>().unwrap().to_string(), tag);
        }
    }

    #[test]
    fn test_every_other_indices() {
        let config = HoleConfig::default();
        assert_eq!(HoleStrategy::EveryOther.indices(10, &config), vec![1, 3, 5, 7, 9]);
        assert!(HoleStrategy::EveryOther.indices(1, &config).is_empty());
    }

    #[test]
    fn test_custom_ignores_out_of_range() {
        let config = HoleConfig {
            pattern: vec![0, 4, 12, 4],
            ..Default::default()
        };
        assert_eq!(HoleStrategy::Custom.indices(5, &config), vec![0, 4, 4]);
    }

    #[test]
    fn test_gradual_accelerates() {
        let config = HoleConfig {
            interval: 2,
            ..Default::default()
        };
        // steps 3, 5, 7, then clamped to the remaining length
        assert_eq!(HoleStrategy::Gradual.indices(20, &config), vec![0, 3, 8, 15]);
        assert_eq!(HoleStrategy::Gradual.indices(1, &config), vec![0]);
        assert!(HoleStrategy::Gradual.indices(0, &config).is_empty());
    }

    #[test]
    fn test_gradual_huge_interval() {
        let config = HoleConfig {
            interval: usize::MAX,
            ..Default::default()
        };
        assert_eq!(HoleStrategy::Gradual.indices(10, &config), vec![0]);
    }

    #[test]
    fn test_gradual_zero_interval_uses_default() {
        let zero = HoleConfig {
            interval: 0,
            ..Default::default()
        };
        assert_eq!(
            HoleStrategy::Gradual.indices(100, &zero),
            HoleStrategy::Gradual.indices(100, &HoleConfig::default())
        );
    }
}
