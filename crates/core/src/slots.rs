//! Contact slot table for multi-touch channels.
//!
//! A contact keeps the slot it was first given until it lifts off. New
//! contacts take the lowest free slot; when every slot is taken the contact
//! is dropped.

use serde::Serialize;

/// Smallest table any touch channel gets.
pub const MIN_SLOTS: usize = 2;
/// Largest table any touch channel gets.
pub const MAX_SLOTS: usize = 10;

/// Table size for a channel reporting at most `touch_max` contacts.
pub fn clamp_slot_count(touch_max: u8) -> usize {
    usize::from(touch_max).clamp(MIN_SLOTS, MAX_SLOTS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotTable {
    slots: Vec<Option<u16>>,
}

impl SlotTable {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count.clamp(MIN_SLOTS, MAX_SLOTS)],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Slot bound to `contact`, else the first free slot. Does not bind.
    pub fn find(&self, contact: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| *s == Some(contact))
            .or_else(|| self.slots.iter().position(Option::is_none))
    }

    /// Find a slot for `contact` and bind it.
    pub fn assign(&mut self, contact: u16) -> Option<usize> {
        let slot = self.find(contact)?;
        self.slots[slot] = Some(contact);
        Some(slot)
    }

    /// Free `slot`. Out-of-range indices are ignored.
    pub fn release(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    /// Contact currently bound to `slot`.
    pub fn get(&self, slot: usize) -> Option<u16> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Number of bound slots.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn size_is_clamped() {
        assert_eq!(clamp_slot_count(0), 2);
        assert_eq!(clamp_slot_count(5), 5);
        assert_eq!(clamp_slot_count(16), 10);
        assert_eq!(SlotTable::new(1).len(), 2);
        assert_eq!(SlotTable::new(40).len(), 10);
    }

    #[test]
    fn reuses_bound_slot() {
        let mut t = SlotTable::new(2);
        assert_eq!(t.assign(7), Some(0));
        assert_eq!(t.assign(9), Some(1));
        assert_eq!(t.assign(7), Some(0));
        assert_eq!(t.assign(9), Some(1));
    }

    #[test]
    fn drops_contact_when_full() {
        let mut t = SlotTable::new(2);
        t.assign(1);
        t.assign(2);
        assert_eq!(t.find(3), None);
        assert_eq!(t.assign(3), None);
        assert_eq!(t.active(), 2);
    }

    #[test]
    fn liftoff_frees_slot_for_next_contact() {
        let mut t = SlotTable::new(2);
        t.assign(1);
        t.assign(2);
        t.release(0);
        assert_eq!(t.get(0), None);
        assert_eq!(t.assign(3), Some(0));
        assert_eq!(t.get(1), Some(2));
    }

    #[test]
    fn clear_empties_everything() {
        let mut t = SlotTable::new(4);
        t.assign(1);
        t.assign(2);
        t.clear();
        assert!(t.is_empty());
        t.release(99);
        assert_eq!(t.active(), 0);
    }

    proptest! {
        #[test]
        fn never_binds_one_id_twice(ops in proptest::collection::vec((any::<bool>(), 0u16..6), 0..64)) {
            let mut t = SlotTable::new(3);
            for (lift, id) in ops {
                if lift {
                    if let Some(slot) = t.find(id).filter(|s| t.get(*s) == Some(id)) {
                        t.release(slot);
                    }
                } else {
                    t.assign(id);
                }
                let bound: Vec<u16> = (0..t.len()).filter_map(|s| t.get(s)).collect();
                let mut dedup = bound.clone();
                dedup.sort_unstable();
                dedup.dedup();
                prop_assert_eq!(bound.len(), dedup.len());
            }
        }

        #[test]
        fn bound_contact_keeps_its_slot(id in 0u16..100, others in proptest::collection::vec(100u16..200, 0..8)) {
            let mut t = SlotTable::new(10);
            let first = t.assign(id);
            prop_assert_eq!(first, Some(0));
            for o in others {
                t.assign(o);
                prop_assert_eq!(t.find(id), first);
            }
        }
    }
}
