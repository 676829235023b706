use std::collections::HashMap;

use super::texture::TextureId;

/// Outcome of a texture-unit lookup.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotLookup {
    /// Already tracked this epoch; the texture is bound, skip the bind.
    Bound(u32),
    /// Newly mapped; the caller must bind the texture to this slot.
    Assigned(u32),
    /// At capacity and the texture is new. Flush, `clear()`, then retry.
    Full,
}

impl SlotLookup {
    #[inline]
    pub fn slot(self) -> Option<u32> {
        match self {
            Self::Bound(s) | Self::Assigned(s) => Some(s),
            Self::Full => None,
        }
    }
}

/// Maps texture ids to a bounded set of texture slots.
///
/// Slots are handed out in order within an epoch and stay stable until
/// `clear()`. The manager never touches GPU state itself.
#[derive(Debug, Clone)]
pub struct TextureUnitManager {
    capacity: u32,
    slots: HashMap<TextureId, u32>,
    next: u32,
}

impl TextureUnitManager {
    pub fn new(capacity: u32) -> Self {
        Self { capacity, slots: HashMap::with_capacity(capacity as usize), next: 0 }
    }

    pub fn get_unit(&mut self, id: TextureId) -> SlotLookup {
        if let Some(&slot) = self.slots.get(&id) {
            return SlotLookup::Bound(slot);
        }
        if self.full() {
            return SlotLookup::Full;
        }

        let slot = self.next;
        self.next += 1;
        self.slots.insert(id, slot);
        SlotLookup::Assigned(slot)
    }

    /// Forgets every assignment; allocation restarts at slot 0.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.next = 0;
    }

    /// True when the next new texture would not get a slot.
    #[inline]
    pub fn full(&self) -> bool {
        self.next >= self.capacity
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.slots.contains_key(&id)
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_lookup_is_bound_to_same_slot() {
        let mut m = TextureUnitManager::new(4);
        assert_eq!(m.get_unit(TextureId(10)), SlotLookup::Assigned(0));
        assert_eq!(m.get_unit(TextureId(11)), SlotLookup::Assigned(1));
        assert_eq!(m.get_unit(TextureId(10)), SlotLookup::Bound(0));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn reports_full_then_restarts_after_clear() {
        let mut m = TextureUnitManager::new(2);
        m.get_unit(TextureId(1));
        m.get_unit(TextureId(2));
        assert!(m.full());

        // known ids still resolve at capacity
        assert_eq!(m.get_unit(TextureId(2)), SlotLookup::Bound(1));
        assert_eq!(m.get_unit(TextureId(3)), SlotLookup::Full);
        assert!(!m.contains(TextureId(3)));

        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.get_unit(TextureId(3)), SlotLookup::Assigned(0));
    }

    #[test]
    fn slots_stay_within_capacity_and_unique() {
        let mut m = TextureUnitManager::new(16);
        let mut seen = std::collections::HashSet::new();
        for id in 0..40 {
            match m.get_unit(TextureId(id)) {
                SlotLookup::Assigned(s) => {
                    assert!(s < 16);
                    assert!(seen.insert(s));
                }
                SlotLookup::Full => {
                    m.clear();
                    seen.clear();
                }
                SlotLookup::Bound(_) => unreachable!(),
            }
        }
    }
}
