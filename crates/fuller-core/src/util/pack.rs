use crate::gadget::Architecture;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Byte order used when packing addresses or searching for values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Least significant byte first
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl FromStr for Endianness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            _ => Err(format!("unknown endianness: {}", s)),
        }
    }
}

/// Packs `addr` into a word of the architecture's width.
///
/// Bits above the word width are truncated.
///
/// ```
/// use fuller_core::gadget::Architecture;
/// use fuller_core::util::{Endianness, pack_address};
///
/// assert_eq!(
///     pack_address(0x11223344, Architecture::X86, Endianness::Little),
///     vec![0x44, 0x33, 0x22, 0x11]
/// );
/// ```
pub fn pack_address(addr: u64, arch: Architecture, endianness: Endianness) -> Vec<u8> {
    let width = arch.word_size();
    let bytes = match endianness {
        Endianness::Little => addr.to_le_bytes(),
        Endianness::Big => addr.to_be_bytes(),
    };
    match endianness {
        Endianness::Little => bytes[..width].to_vec(),
        Endianness::Big => bytes[8 - width..].to_vec(),
    }
}

/// Unpacks a word of the architecture's width from the start of `bytes`.
///
/// Returns `None` if fewer than [`Architecture::word_size`] bytes are given.
pub fn unpack_address(bytes: &[u8], arch: Architecture, endianness: Endianness) -> Option<u64> {
    let width = arch.word_size();
    let word = bytes.get(..width)?;
    let mut buf = [0u8; 8];
    let value = match endianness {
        Endianness::Little => {
            buf[..width].copy_from_slice(word);
            u64::from_le_bytes(buf)
        }
        Endianness::Big => {
            buf[8 - width..].copy_from_slice(word);
            u64::from_be_bytes(buf)
        }
    };
    Some(value)
}
