use serde::Serialize;

/// Kind of object occupying a slot.
///
/// Shapes only matter to controlled grooming, which interleaves different object
/// kinds of the same nominal size to emulate a mixed-type heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotShape {
    /// Array of tagged 8-byte values
    Array,
    /// Array of 32-bit words
    Words,
    /// Array of 64-bit floats
    Floats,
    /// Small record holding a reference to a separate buffer
    Record,
    /// Raw byte buffer
    Buffer,
}

/// An occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Size of the object in bytes
    pub size: usize,
    /// 32-bit stamp the object is filled with
    pub fill: u32,
    /// Kind of object
    pub shape: SlotShape,
}

impl Allocation {
    /// Creates an allocation description.
    pub fn new(size: usize, fill: u32, shape: SlotShape) -> Self {
        Self { size, fill, shape }
    }
}

/// One position in an allocation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Slot {
    /// The slot holds an object
    Occupied(Allocation),
    /// The slot was punched out
    Empty,
}

impl Slot {
    /// Returns `true` if the slot is a hole.
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// Returns the allocation occupying this slot, if any.
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            Slot::Occupied(allocation) => Some(allocation),
            Slot::Empty => None,
        }
    }

    /// Size of the occupying object, 0 for holes.
    pub fn size(&self) -> usize {
        self.allocation().map_or(0, |a| a.size)
    }
}

impl From<Allocation> for Slot {
    fn from(allocation: Allocation) -> Self {
        Slot::Occupied(allocation)
    }
}
