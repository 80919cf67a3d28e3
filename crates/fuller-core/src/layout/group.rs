use crate::layout::Slot;
use serde::Serialize;
use std::fmt;

/// Opaque identifier of an allocation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupId(pub(crate) u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grp-{}", self.0)
    }
}

/// A named, fixed-length sequence of slots.
///
/// The number of slots is fixed at creation. Punching holes only changes whether
/// a slot is occupied.
#[derive(Clone, Debug, Serialize)]
pub struct AllocationGroup {
    id: GroupId,
    slots: Vec<Slot>,
    /// Bytes requested when the group was groomed
    requested: usize,
}

impl AllocationGroup {
    pub(crate) fn new(id: GroupId, slots: Vec<Slot>, requested: usize) -> Self {
        Self {
            id,
            slots,
            requested,
        }
    }

    /// The group's identifier.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// The current slot table.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of slots, occupied or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the group has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bytes requested when the group was groomed.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Bytes held by the slots that are still occupied.
    pub fn occupied_bytes(&self) -> usize {
        self.slots.iter().map(Slot::size).sum()
    }

    /// Empties the slots at `indices`, ignoring out-of-range indices.
    ///
    /// Returns the number of slots that were occupied before.
    pub(crate) fn punch(&mut self, indices: &[usize]) -> usize {
        let mut punched = 0;
        for &index in indices {
            if let Some(slot) = self.slots.get_mut(index) {
                if !slot.is_empty() {
                    punched += 1;
                }
                *slot = Slot::Empty;
            }
        }
        punched
    }

    /// Empties every slot.
    pub(crate) fn clear(&mut self) {
        self.slots.fill(Slot::Empty);
    }
}
