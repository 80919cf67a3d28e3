use crate::layout::LayoutError;
use crate::util::{SCATTER_INTERVAL, SPRAY_COUNT, SPRAY_SLOT_SIZE, Size, XOR_STRIDE};
use indicatif::ProgressBar;
use log::warn;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a spray set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SprayId(pub(crate) u64);

impl fmt::Display for SprayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spray-{}", self.0)
    }
}

/// Placement of sprayed buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Every slot is stamped
    #[default]
    Uniform,
    /// Every tenth slot is left empty
    Scattered,
}

impl FromStr for Distribution {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Distribution::Uniform),
            "scattered" => Ok(Distribution::Scattered),
            _ => Err(LayoutError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Rule deriving the stamp of buffer `i` from the base pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// The base pattern itself
    #[default]
    Raw,
    /// `base + i`
    Incremental,
    /// `base` rotated left by `i % 32` bits
    Rotated,
    /// `base ^ (i * 0x12345678)`
    Xor,
}

impl Encoding {
    /// Computes the stamp of buffer `index`. All arithmetic wraps at 32 bits.
    pub fn stamp(&self, base: u32, index: usize) -> u32 {
        let index = index as u32;
        match self {
            Encoding::Raw => base,
            Encoding::Incremental => base.wrapping_add(index),
            Encoding::Rotated => base.rotate_left(index % 32),
            Encoding::Xor => base ^ index.wrapping_mul(XOR_STRIDE),
        }
    }
}

impl FromStr for Encoding {
    type Err = Infallible;

    /// Unknown encodings fall back to [`Encoding::Raw`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "raw" => Encoding::Raw,
            "incremental" => Encoding::Incremental,
            "rotated" => Encoding::Rotated,
            "xor" => Encoding::Xor,
            other => {
                warn!("Unknown spray encoding {:?}, using raw", other);
                Encoding::Raw
            }
        })
    }
}

/// Parameters of a spray.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SprayConfig {
    /// Size of each buffer; must be a non-zero multiple of 4 bytes
    pub slot_size: Size,
    /// Number of buffers
    pub count: usize,
    /// Base 32-bit stamp
    pub base_pattern: u32,
    /// Placement of the buffers
    pub distribution: Distribution,
    /// Derivation of per-buffer stamps
    pub encoding: Encoding,
}

impl Default for SprayConfig {
    fn default() -> Self {
        Self {
            slot_size: Size::B(SPRAY_SLOT_SIZE),
            count: SPRAY_COUNT,
            base_pattern: 0x4141_4141,
            distribution: Distribution::Uniform,
            encoding: Encoding::Raw,
        }
    }
}

/// An immutable set of stamped buffers.
#[derive(Clone, Debug)]
pub struct SpraySet {
    id: SprayId,
    slot_size: usize,
    buffers: Vec<Option<Vec<u8>>>,
}

impl SpraySet {
    pub(crate) fn build(
        id: SprayId,
        config: &SprayConfig,
        progress: Option<&ProgressBar>,
    ) -> Result<Self, LayoutError> {
        let slot_size = config.slot_size.bytes();
        if slot_size == 0 || slot_size % 4 != 0 {
            return Err(LayoutError::InvalidInput(format!(
                "spray slot size {} is not a positive multiple of 4",
                config.slot_size
            )));
        }
        if config.count == 0 {
            return Err(LayoutError::InvalidInput("spray count must be positive".into()));
        }
        let mut buffers = Vec::with_capacity(config.count);
        for i in 0..config.count {
            if config.distribution == Distribution::Scattered && i % SCATTER_INTERVAL == 0 {
                buffers.push(None);
            } else {
                let stamp = config.encoding.stamp(config.base_pattern, i);
                buffers.push(Some(stamp.to_le_bytes().repeat(slot_size / 4)));
            }
            if let Some(p) = progress {
                p.inc(1);
            }
        }
        Ok(Self {
            id,
            slot_size,
            buffers,
        })
    }

    /// The set's identifier.
    pub fn id(&self) -> SprayId {
        self.id
    }

    /// Size of each buffer in bytes.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// The buffers in order; `None` marks a slot left empty.
    pub fn buffers(&self) -> &[Option<Vec<u8>>] {
        &self.buffers
    }

    /// Number of slots, stamped or empty.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if the set has no slots.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of stamped buffers.
    pub fn stamped(&self) -> usize {
        self.buffers.iter().flatten().count()
    }

    /// The stamp of buffer `index`, or `None` for empty or missing slots.
    pub fn stamp_at(&self, index: usize) -> Option<u32> {
        let buffer = self.buffers.get(index)?.as_ref()?;
        let word: [u8; 4] = buffer.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodings() {
        let base = 0x4141_4141;
        assert_eq!(Encoding::Raw.stamp(base, 7), base);
        assert_eq!(Encoding::Incremental.stamp(0xFFFF_FFFF, 2), 1);
        assert_eq!(Encoding::Rotated.stamp(0x8000_0001, 1), 0x0000_0003);
        assert_eq!(Encoding::Rotated.stamp(base, 32), base);
        assert_eq!(Encoding::Xor.stamp(base, 0), base);
        assert_eq!(Encoding::Xor.stamp(0, 1), 0x1234_5678);
        assert_eq!(Encoding::Xor.stamp(0, 16), 0x2345_6780);
    }

    #[test]
    fn test_unknown_encoding_is_raw() {
        assert_eq!("base64".parse::<Encoding>().unwrap(), Encoding::Raw);
        assert!("clustered".parse::<Distribution>().is_err());
    }

    #[test]
    fn test_scattered_leaves_every_tenth_empty() {
        let config = SprayConfig {
            slot_size: Size::B(16),
            count: 25,
            distribution: Distribution::Scattered,
            ..Default::default()
        };
        let set = SpraySet::build(SprayId(0), &config, None).unwrap();
        assert_eq!(set.len(), 25);
        assert_eq!(set.stamped(), 22);
        for i in [0, 10, 20] {
            assert!(set.buffers()[i].is_none());
        }
        assert_eq!(set.stamp_at(1), Some(0x4141_4141));
    }

    #[test]
    fn test_buffers_are_stamped_words() {
        let config = SprayConfig {
            slot_size: Size::B(8),
            count: 2,
            base_pattern: 0x1122_3344,
            encoding: Encoding::Incremental,
            ..Default::default()
        };
        let set = SpraySet::build(SprayId(0), &config, None).unwrap();
        assert_eq!(
            set.buffers()[1].as_deref(),
            Some(&[0x45, 0x33, 0x22, 0x11, 0x45, 0x33, 0x22, 0x11][..])
        );
    }

    #[test]
    fn test_invalid_slot_size() {
        let config = SprayConfig {
            slot_size: Size::B(6),
            ..Default::default()
        };
        assert!(matches!(
            SpraySet::build(SprayId(0), &config, None),
            Err(LayoutError::InvalidInput(_))
        ));
    }
}
