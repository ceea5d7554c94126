//! Derived potion properties.
//!
//! Both calculators are pure: they read ledger contents and registry data
//! and return values for the state machine to store.

use crate::id::EffectId;
use crate::ledger::{CountedMap, OrderedSlotList};
use crate::matcher::RecipeMatcher;
use crate::registry::{HerbFamily, Registry};
use serde::{Deserialize, Serialize};

/// Color of plain water and of any brew no recipe recognises.
pub const NEUTRAL_COLOR: u32 = 0x3F76E4;

/// The station's potion, provisional while brewing and final once complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionProperties {
    pub color: u32,
    pub duration_seconds: u32,
    pub level: u32,
    pub effect: Option<EffectId>,
}

impl Default for PotionProperties {
    fn default() -> Self {
        Self {
            color: NEUTRAL_COLOR,
            duration_seconds: 0,
            level: 0,
            effect: None,
        }
    }
}

/// How herbs convert into duration and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerbRates {
    pub base_duration: u32,
    pub max_duration: u32,
    pub duration_per_herb: u32,
    /// Nether/end herbs needed per level step. Zero pins the level at 1.
    pub herbs_per_level: u32,
    pub max_level: u32,
}

impl Default for HerbRates {
    fn default() -> Self {
        Self {
            base_duration: 120,
            max_duration: 480,
            duration_per_herb: 30,
            herbs_per_level: 12,
            max_level: 4,
        }
    }
}

/// Color and effect fixed when brewing begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialProperties {
    pub color: u32,
    pub effect: Option<EffectId>,
}

/// Duration and level fixed when brewing finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalProperties {
    pub duration_seconds: u32,
    pub level: u32,
}

/// Resolve the provisional potion from the exact-multiset brewing match.
pub fn compute_initial(materials: &OrderedSlotList, registry: &Registry) -> InitialProperties {
    match RecipeMatcher::new(registry).find_brewing(materials) {
        Some((_, recipe)) => InitialProperties {
            color: recipe.color,
            effect: Some(recipe.effect),
        },
        None => InitialProperties {
            color: NEUTRAL_COLOR,
            effect: None,
        },
    }
}

/// Compute duration and level from accumulated herbs.
///
/// `effect` further caps the level when its registry entry sets a lower
/// maximum than `rates`.
pub fn compute_final(
    herbs: &CountedMap,
    registry: &Registry,
    rates: &HerbRates,
    effect: Option<EffectId>,
) -> FinalProperties {
    let mut overworld: u32 = 0;
    let mut nether_end: u32 = 0;
    for (kind, count) in herbs.iter() {
        match registry.herb_family(kind) {
            Some(HerbFamily::Overworld) => overworld = overworld.saturating_add(count),
            Some(HerbFamily::NetherOrEnd) => nether_end = nether_end.saturating_add(count),
            None => {}
        }
    }

    let max_duration = rates.max_duration.max(rates.base_duration);
    let duration_seconds = rates
        .base_duration
        .saturating_add(overworld.saturating_mul(rates.duration_per_herb))
        .clamp(rates.base_duration, max_duration);

    let steps = nether_end.checked_div(rates.herbs_per_level).unwrap_or(0);
    let cap = rates.max_level.min(registry.max_level(effect)).max(1);
    let level = steps.saturating_add(1).min(cap);

    FinalProperties {
        duration_seconds,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::KindId;
    use crate::item::ResourceStack;
    use crate::test_utils::*;

    fn herbs(pairs: &[(KindId, u32)]) -> CountedMap {
        let mut map = CountedMap::default();
        for &(k, c) in pairs {
            let _ = map.try_add(k, c);
        }
        map
    }

    #[test]
    fn no_herbs_gives_base_duration_level_one() {
        let reg = brewing_registry();
        let out = compute_final(&CountedMap::default(), &reg, &HerbRates::default(), None);
        assert_eq!(out.duration_seconds, 120);
        assert_eq!(out.level, 1);
    }

    #[test]
    fn four_overworld_herbs_give_240_seconds() {
        let reg = brewing_registry();
        let out = compute_final(
            &herbs(&[(scaleplate(), 4)]),
            &reg,
            &HerbRates::default(),
            None,
        );
        assert_eq!(out.duration_seconds, 240);
    }

    #[test]
    fn duration_clamps_at_max() {
        let reg = brewing_registry();
        let out = compute_final(
            &herbs(&[(scaleplate(), 64), (dewpetal(), 64)]),
            &reg,
            &HerbRates::default(),
            None,
        );
        assert_eq!(out.duration_seconds, 480);
    }

    #[test]
    fn level_steps_every_twelve() {
        let reg = brewing_registry();
        let rates = HerbRates::default();
        let level = |n| compute_final(&herbs(&[(burnt_node(), n)]), &reg, &rates, None).level;
        assert_eq!(level(11), 1);
        assert_eq!(level(12), 2);
        assert_eq!(level(24), 3);
        assert_eq!(level(64), 4);
    }

    #[test]
    fn effect_cap_lowers_level() {
        let reg = brewing_registry();
        let out = compute_final(
            &herbs(&[(burnt_node(), 48)]),
            &reg,
            &HerbRates::default(),
            Some(regeneration()),
        );
        assert_eq!(out.level, 2);
    }

    #[test]
    fn zero_herbs_per_level_pins_level_one() {
        let reg = brewing_registry();
        let rates = HerbRates {
            herbs_per_level: 0,
            ..HerbRates::default()
        };
        let out = compute_final(&herbs(&[(burnt_node(), 60)]), &reg, &rates, None);
        assert_eq!(out.level, 1);
    }

    #[test]
    fn non_herb_kinds_are_ignored() {
        let reg = brewing_registry();
        let out = compute_final(&herbs(&[(ash(), 30)]), &reg, &HerbRates::default(), None);
        assert_eq!(out.duration_seconds, 120);
        assert_eq!(out.level, 1);
    }

    #[test]
    fn initial_uses_matching_recipe_color() {
        let reg = brewing_registry();
        let mut materials = OrderedSlotList::default();
        let _ = materials.try_add(&ResourceStack::new(ash(), 2));
        let out = compute_initial(&materials, &reg);
        assert_eq!(out.effect, Some(regeneration()));
        assert_eq!(out.color, REGEN_COLOR);
    }

    #[test]
    fn initial_without_match_is_neutral() {
        let reg = brewing_registry();
        let mut materials = OrderedSlotList::default();
        let _ = materials.try_add(&ResourceStack::new(ash(), 3));
        let out = compute_initial(&materials, &reg);
        assert_eq!(out.effect, None);
        assert_eq!(out.color, NEUTRAL_COLOR);
    }
}
