use serde::{Serialize, Serializer};

/// Object size representation supporting common units.
///
/// This enum provides a convenient way to specify slot sizes in bytes, kilobytes,
/// megabytes, or gigabytes. All units use binary (base-2) multipliers (1 KB = 1024 bytes).
///
/// # Examples
///
/// ```
/// use fuller_core::util::Size;
///
/// let size = Size::KB(4);
/// assert_eq!(size.bytes(), 0x1000);
///
/// let small = Size::B(0x100);
/// assert_eq!(small.bytes(), 256);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Size {
    /// Size in bytes
    B(usize),
    /// Size in kilobytes (1 KB = 1024 bytes)
    KB(usize),
    /// Size in megabytes (1 MB = 1024 KB)
    MB(usize),
    /// Size in gigabytes (1 GB = 1024 MB)
    GB(usize),
}

impl Size {
    /// Converts this size to bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use fuller_core::util::Size;
    ///
    /// assert_eq!(Size::B(100).bytes(), 100);
    /// assert_eq!(Size::KB(1).bytes(), 1024);
    /// assert_eq!(Size::MB(1).bytes(), 1048576);
    /// assert_eq!(Size::GB(1).bytes(), 1073741824);
    /// ```
    pub const fn bytes(&self) -> usize {
        match self {
            Size::B(bytes) => *bytes,
            Size::KB(kb) => *kb * (1 << 10),
            Size::MB(mb) => *mb * (1 << 20),
            Size::GB(gb) => *gb * (1 << 30),
        }
    }

    /// Rounds the byte count up to the next multiple of `alignment`.
    ///
    /// `alignment` must be a power of two. Returns `None` if the rounded size
    /// does not fit into a `usize`.
    ///
    /// ```
    /// use fuller_core::util::Size;
    ///
    /// assert_eq!(Size::B(100).align_up(16), Some(112));
    /// assert_eq!(Size::B(128).align_up(16), Some(128));
    /// assert_eq!(Size::B(usize::MAX - 3).align_up(16), None);
    /// ```
    pub const fn align_up(&self, alignment: usize) -> Option<usize> {
        let mask = alignment - 1;
        match self.bytes().checked_add(mask) {
            Some(bytes) => Some(bytes & !mask),
            None => None,
        }
    }
}

impl From<usize> for Size {
    fn from(bytes: usize) -> Self {
        Size::B(bytes)
    }
}

impl Serialize for Size {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bytes() as u64)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Size::B(bytes) => write!(f, "{} B", bytes),
            Size::KB(kb) => write!(f, "{} KB", kb),
            Size::MB(mb) => write!(f, "{} MB", mb),
            Size::GB(gb) => write!(f, "{} GB", gb),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::util::Size;

    #[test]
    fn size_conversions() {
        let bytes = Size::B(12);
        assert_eq!(bytes.bytes(), 12);
        let kb = Size::KB(4);
        assert_eq!(kb.bytes(), 0x1000);
        let gb = Size::GB(2);
        assert_eq!(gb.bytes(), 2 * (1 << 30));
    }

    #[test]
    fn size_alignment() {
        assert_eq!(Size::B(1).align_up(16), Some(16));
        assert_eq!(Size::B(17).align_up(16), Some(32));
        assert_eq!(Size::B(0).align_up(16), Some(0));
        assert_eq!(Size::B(usize::MAX).align_up(16), None);
    }
}
