//! Capacity-bounded resource containers held by a station.
//!
//! Neither container ever fails: a transfer that does not fully fit is
//! capped, and the caller learns how much actually moved.

use crate::id::KindId;
use crate::item::ResourceStack;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum distinct kinds in the material list.
pub const MAX_MATERIAL_KINDS: usize = 9;

/// Maximum units of one kind in a slot or herb counter.
pub const MAX_UNITS_PER_KIND: u32 = 64;

/// Which entry a removal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The most recently added entry.
    Any,
    Kind(KindId),
}

// ---------------------------------------------------------------------------
// OrderedSlotList
// ---------------------------------------------------------------------------

/// Materials in insertion order. Each slot holds one stackable kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedSlotList {
    slots: Vec<ResourceStack>,
    slot_limit: usize,
    unit_cap: u32,
}

impl Default for OrderedSlotList {
    fn default() -> Self {
        Self::new(MAX_MATERIAL_KINDS, MAX_UNITS_PER_KIND)
    }
}

impl OrderedSlotList {
    pub fn new(slot_limit: usize, unit_cap: u32) -> Self {
        Self {
            slots: Vec::with_capacity(slot_limit),
            slot_limit,
            unit_cap,
        }
    }

    /// Add as much of `stack` as fits. Returns the number of units taken.
    ///
    /// A stack that merges with an existing slot only tops that slot up; it
    /// never opens a second slot for the same kind.
    #[must_use = "returns the quantity actually added, which may be less than offered"]
    pub fn try_add(&mut self, stack: &ResourceStack) -> u32 {
        if stack.count == 0 {
            return 0;
        }
        if let Some(slot) = self.slots.iter_mut().find(|s| s.stacks_with(stack)) {
            let space = self.unit_cap.saturating_sub(slot.count);
            let to_add = stack.count.min(space);
            slot.count += to_add;
            return to_add;
        }
        if self.slots.len() >= self.slot_limit {
            return 0;
        }
        let to_add = stack.count.min(self.unit_cap);
        if to_add > 0 {
            self.slots.push(stack.with_count(to_add));
        }
        to_add
    }

    /// Remove up to `amount` units from the selected slot (LIFO for
    /// [`Selector::Any`]). Returns the removed units as a stack.
    pub fn take(&mut self, selector: Selector, amount: u32) -> Option<ResourceStack> {
        let index = match selector {
            Selector::Any => self.slots.len().checked_sub(1)?,
            Selector::Kind(kind) => self.slots.iter().rposition(|s| s.kind == kind)?,
        };
        let taken = self.slots[index].split(amount)?;
        if self.slots[index].is_empty() {
            self.slots.remove(index);
        }
        Some(taken)
    }

    /// Remove up to `amount` units. Returns the number actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn try_remove(&mut self, selector: Selector, amount: u32) -> u32 {
        self.take(selector, amount).map_or(0, |s| s.count)
    }

    /// Take one unit from the last slot, or the whole slot when `bulk`.
    pub fn take_last(&mut self, bulk: bool) -> Option<ResourceStack> {
        let amount = if bulk { self.unit_cap } else { 1 };
        self.take(Selector::Any, amount)
    }

    /// Remove everything, returning the slots in insertion order.
    pub fn drain(&mut self) -> Vec<ResourceStack> {
        std::mem::take(&mut self.slots)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    pub fn unit_cap(&self) -> u32 {
        self.unit_cap
    }

    pub fn get(&self, index: usize) -> Option<&ResourceStack> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceStack> {
        self.slots.iter()
    }

    /// Total units of `kind` across all slots.
    pub fn count_of(&self, kind: KindId) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.count)
            .sum()
    }

    /// Kind -> total units, ignoring properties and order.
    pub fn histogram(&self) -> BTreeMap<KindId, u32> {
        let mut out = BTreeMap::new();
        for slot in &self.slots {
            *out.entry(slot.kind).or_insert(0) += slot.count;
        }
        out
    }

    /// Set of distinct kinds present.
    pub fn kinds(&self) -> BTreeSet<KindId> {
        self.slots.iter().map(|s| s.kind).collect()
    }
}

// ---------------------------------------------------------------------------
// CountedMap
// ---------------------------------------------------------------------------

/// Unordered kind -> count accumulator with a per-kind cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedMap {
    counts: BTreeMap<KindId, u32>,
    unit_cap: u32,
}

impl Default for CountedMap {
    fn default() -> Self {
        Self::new(MAX_UNITS_PER_KIND)
    }
}

impl CountedMap {
    pub fn new(unit_cap: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            unit_cap,
        }
    }

    /// Add up to `amount` units of `kind`, clamped to the per-kind cap.
    #[must_use = "returns the quantity actually added, which may be less than offered"]
    pub fn try_add(&mut self, kind: KindId, amount: u32) -> u32 {
        let current = self.get(kind);
        let to_add = amount.min(self.unit_cap.saturating_sub(current));
        if to_add > 0 {
            self.counts.insert(kind, current + to_add);
        }
        to_add
    }

    /// Remove up to `amount` units. [`Selector::Any`] picks the lowest kind id
    /// present. Empty counters are dropped.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn try_remove(&mut self, selector: Selector, amount: u32) -> u32 {
        let kind = match selector {
            Selector::Any => match self.counts.keys().next() {
                Some(&k) => k,
                None => return 0,
            },
            Selector::Kind(kind) => kind,
        };
        let Some(current) = self.counts.get_mut(&kind) else {
            return 0;
        };
        let removed = amount.min(*current);
        *current -= removed;
        if *current == 0 {
            self.counts.remove(&kind);
        }
        removed
    }

    pub fn get(&self, kind: KindId) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn unit_cap(&self) -> u32 {
        self.unit_cap
    }

    pub fn iter(&self) -> impl Iterator<Item = (KindId, u32)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Remove everything, returning one stack per kind.
    pub fn drain(&mut self) -> Vec<ResourceStack> {
        std::mem::take(&mut self.counts)
            .into_iter()
            .map(|(kind, count)| ResourceStack::new(kind, count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed64;
    use crate::item::bound;

    fn stack(kind: u32, count: u32) -> ResourceStack {
        ResourceStack::new(KindId(kind), count)
    }

    // -----------------------------------------------------------------------
    // OrderedSlotList
    // -----------------------------------------------------------------------

    #[test]
    fn add_caps_at_unit_cap() {
        let mut list = OrderedSlotList::default();
        assert_eq!(list.try_add(&stack(0, 70)), 64);
        assert_eq!(list.count_of(KindId(0)), 64);
        assert_eq!(list.try_add(&stack(0, 1)), 0);
    }

    #[test]
    fn add_merges_into_existing_slot() {
        let mut list = OrderedSlotList::default();
        assert_eq!(list.try_add(&stack(0, 10)), 10);
        assert_eq!(list.try_add(&stack(0, 60)), 54);
        assert_eq!(list.len(), 1);
        assert_eq!(list.count_of(KindId(0)), 64);
    }

    #[test]
    fn add_rejects_tenth_kind() {
        let mut list = OrderedSlotList::default();
        for k in 0..9 {
            assert_eq!(list.try_add(&stack(k, 1)), 1);
        }
        assert_eq!(list.try_add(&stack(9, 5)), 0);
        assert_eq!(list.len(), 9);
        // Existing kinds still merge when full.
        assert_eq!(list.try_add(&stack(3, 5)), 5);
    }

    #[test]
    fn differing_properties_open_new_slot() {
        let mut list = OrderedSlotList::default();
        let mut bound_stack = stack(0, 1);
        bound_stack.set_property(bound::LEVEL, Fixed64::from_num(2));
        let _ = list.try_add(&stack(0, 1));
        let _ = list.try_add(&bound_stack);
        assert_eq!(list.len(), 2);
        assert_eq!(list.count_of(KindId(0)), 2);
        assert_eq!(list.histogram()[&KindId(0)], 2);
    }

    #[test]
    fn take_any_is_lifo() {
        let mut list = OrderedSlotList::default();
        let _ = list.try_add(&stack(0, 3));
        let _ = list.try_add(&stack(1, 2));
        let taken = list.take(Selector::Any, 1).unwrap();
        assert_eq!(taken.kind, KindId(1));
        assert_eq!(list.count_of(KindId(1)), 1);
    }

    #[test]
    fn take_last_bulk_empties_slot() {
        let mut list = OrderedSlotList::default();
        let _ = list.try_add(&stack(0, 3));
        let _ = list.try_add(&stack(1, 40));
        let taken = list.take_last(true).unwrap();
        assert_eq!(taken, stack(1, 40));
        assert_eq!(list.len(), 1);
        let one = list.take_last(false).unwrap();
        assert_eq!(one.count, 1);
        assert_eq!(list.count_of(KindId(0)), 2);
    }

    #[test]
    fn remove_by_kind_caps_at_stock() {
        let mut list = OrderedSlotList::default();
        let _ = list.try_add(&stack(0, 3));
        let _ = list.try_add(&stack(1, 2));
        assert_eq!(list.try_remove(Selector::Kind(KindId(0)), 10), 3);
        assert_eq!(list.try_remove(Selector::Kind(KindId(0)), 1), 0);
        assert_eq!(list.kinds(), BTreeSet::from([KindId(1)]));
    }

    #[test]
    fn remove_from_empty_is_zero() {
        let mut list = OrderedSlotList::default();
        assert_eq!(list.try_remove(Selector::Any, 1), 0);
        assert!(list.take_last(true).is_none());
    }

    #[test]
    fn drain_preserves_order() {
        let mut list = OrderedSlotList::default();
        let _ = list.try_add(&stack(2, 1));
        let _ = list.try_add(&stack(0, 1));
        let drained = list.drain();
        assert_eq!(drained, vec![stack(2, 1), stack(0, 1)]);
        assert!(list.is_empty());
    }

    // -----------------------------------------------------------------------
    // CountedMap
    // -----------------------------------------------------------------------

    #[test]
    fn counted_add_caps_per_kind() {
        let mut herbs = CountedMap::default();
        assert_eq!(herbs.try_add(KindId(0), 50), 50);
        assert_eq!(herbs.try_add(KindId(0), 50), 14);
        assert_eq!(herbs.try_add(KindId(1), 64), 64);
        assert_eq!(herbs.total(), 128);
    }

    #[test]
    fn counted_remove_drops_empty_entries() {
        let mut herbs = CountedMap::default();
        let _ = herbs.try_add(KindId(4), 3);
        assert_eq!(herbs.try_remove(Selector::Kind(KindId(4)), 5), 3);
        assert!(herbs.is_empty());
        assert_eq!(herbs.try_remove(Selector::Any, 1), 0);
    }

    #[test]
    fn counted_remove_any_picks_lowest_kind() {
        let mut herbs = CountedMap::default();
        let _ = herbs.try_add(KindId(5), 2);
        let _ = herbs.try_add(KindId(1), 2);
        assert_eq!(herbs.try_remove(Selector::Any, 1), 1);
        assert_eq!(herbs.get(KindId(1)), 1);
        assert_eq!(herbs.get(KindId(5)), 2);
    }

    #[test]
    fn counted_drain_returns_stacks() {
        let mut herbs = CountedMap::default();
        let _ = herbs.try_add(KindId(1), 2);
        let _ = herbs.try_add(KindId(0), 7);
        let drained = herbs.drain();
        assert_eq!(drained, vec![stack(0, 7), stack(1, 2)]);
        assert!(herbs.is_empty());
    }
}
