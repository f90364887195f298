//! Dense slot indices and playback entry identifiers.

use serde::{Deserialize, Serialize};

/// Slot of a parameter inside a [`crate::ModelState`].
///
/// Real parameters occupy `0..parameter_count`; shadow slots for identifiers
/// unknown to the loaded model follow contiguously after the last real slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamIndex(pub usize);

/// Slot of a part. Same real/shadow split as [`ParamIndex`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartIndex(pub usize);

/// Slot of a drawable. Drawables never get shadow slots.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrawableIndex(pub usize);

/// Identifier of an expression playback entry owned by an [`crate::ExpressionManager`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Monotonic allocator for playback entry ids.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_entry: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_entry(&mut self) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry = self.next_entry.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_entry(), EntryId(0));
        assert_eq!(alloc.alloc_entry(), EntryId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_entry(), EntryId(0));
    }
}
