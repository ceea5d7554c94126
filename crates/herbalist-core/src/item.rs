use crate::fixed::Fixed64;
use crate::id::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stack of one resource kind with optional per-stack properties.
///
/// Two stacks are interchangeable (and merge into one material slot) only
/// when both the kind and the full property map are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStack {
    pub kind: KindId,
    pub count: u32,
    /// Per-stack properties (bound potion data, herb costs).
    /// Empty for plain materials.
    #[serde(default)]
    pub properties: BTreeMap<PropertyId, Fixed64>,
}

impl ResourceStack {
    pub fn new(kind: KindId, count: u32) -> Self {
        Self {
            kind,
            count,
            properties: BTreeMap::new(),
        }
    }

    pub fn set_property(&mut self, id: PropertyId, value: Fixed64) {
        self.properties.insert(id, value);
    }

    pub fn get_property(&self, id: PropertyId) -> Option<Fixed64> {
        self.properties.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True when `other` can merge into this stack.
    pub fn stacks_with(&self, other: &ResourceStack) -> bool {
        self.kind == other.kind && self.properties == other.properties
    }

    /// A copy of this stack with a different count.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            kind: self.kind,
            count,
            properties: self.properties.clone(),
        }
    }

    /// Split up to `amount` units off this stack. Returns `None` when nothing
    /// could be taken.
    pub fn split(&mut self, amount: u32) -> Option<ResourceStack> {
        let taken = amount.min(self.count);
        if taken == 0 {
            return None;
        }
        self.count -= taken;
        Some(self.with_count(taken))
    }
}

// ---------------------------------------------------------------------------
// Bound-potion properties
// ---------------------------------------------------------------------------

/// Property ids stamped on items produced by a potion-binding infusion.
pub mod bound {
    use super::*;

    pub const EFFECT: PropertyId = PropertyId(1);
    pub const COLOR: PropertyId = PropertyId(2);
    pub const DURATION: PropertyId = PropertyId(3);
    pub const LEVEL: PropertyId = PropertyId(4);

    /// First property id used for per-herb costs.
    pub const HERB_COST_BASE: u16 = 0x100;

    /// Property id recording how many units of `herb` the bound potion cost.
    /// `None` when the kind id is too large to be encoded.
    pub fn herb_cost(herb: KindId) -> Option<PropertyId> {
        u16::try_from(herb.0)
            .ok()
            .and_then(|k| k.checked_add(HERB_COST_BASE))
            .map(PropertyId)
    }

    /// True when the stack carries a bound potion.
    pub fn is_bound(stack: &ResourceStack) -> bool {
        stack.properties.contains_key(&EFFECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stack_has_no_properties() {
        let s = ResourceStack::new(KindId(0), 5);
        assert!(s.properties.is_empty());
        assert!(!s.is_empty());
    }

    #[test]
    fn stacks_with_requires_equal_properties() {
        let a = ResourceStack::new(KindId(0), 5);
        let mut b = ResourceStack::new(KindId(0), 1);
        assert!(a.stacks_with(&b));
        b.set_property(bound::COLOR, Fixed64::from_num(0xFF));
        assert!(!a.stacks_with(&b));
        assert!(!a.stacks_with(&ResourceStack::new(KindId(1), 5)));
    }

    #[test]
    fn split_takes_at_most_count() {
        let mut s = ResourceStack::new(KindId(2), 3);
        let taken = s.split(5).unwrap();
        assert_eq!(taken.count, 3);
        assert_eq!(s.count, 0);
        assert!(s.split(1).is_none());
    }

    #[test]
    fn split_keeps_properties() {
        let mut s = ResourceStack::new(KindId(2), 3);
        s.set_property(bound::LEVEL, Fixed64::from_num(2));
        let taken = s.split(1).unwrap();
        assert_eq!(taken.get_property(bound::LEVEL), Some(Fixed64::from_num(2)));
        assert_eq!(s.count, 2);
    }

    #[test]
    fn herb_cost_ids_are_offset() {
        assert_eq!(bound::herb_cost(KindId(3)), Some(PropertyId(0x103)));
        assert_eq!(bound::herb_cost(KindId(u32::MAX)), None);
    }
}
