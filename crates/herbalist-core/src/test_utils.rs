//! Shared fixtures for unit, property, and integration tests.
//!
//! [`brewing_registry`] registers kinds, effects, and recipes in a fixed
//! order, so the id helpers below are stable.

use crate::id::*;
use crate::item::ResourceStack;
use crate::property::{HerbRates, PotionProperties};
use crate::recipe::*;
use crate::registry::{HerbFamily, Registry, RegistryBuilder};

pub const REGEN_COLOR: u32 = 0xCD5CAB;
pub const SPEED_COLOR: u32 = 0x7CAFC6;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

pub fn ash() -> KindId {
    KindId(0)
}

pub fn lumistone() -> KindId {
    KindId(1)
}

pub fn scaleplate() -> KindId {
    KindId(2)
}

pub fn dewpetal() -> KindId {
    KindId(3)
}

pub fn golden_lilybell() -> KindId {
    KindId(4)
}

pub fn cryst_spine() -> KindId {
    KindId(5)
}

pub fn burnt_node() -> KindId {
    KindId(6)
}

pub fn heart_of_stardream() -> KindId {
    KindId(7)
}

pub fn flowweave_ring() -> KindId {
    KindId(8)
}

pub fn gold_ingot() -> KindId {
    KindId(9)
}

pub fn blessed_gold() -> KindId {
    KindId(10)
}

pub fn polished_lumistone() -> KindId {
    KindId(11)
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

pub fn regeneration() -> EffectId {
    EffectId(0)
}

pub fn speed() -> EffectId {
    EffectId(1)
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// Builder with every fixture kind and effect registered but no recipes.
pub fn fixture_builder() -> RegistryBuilder {
    let mut b = RegistryBuilder::new();
    b.register_kind("ash", None);
    b.register_kind("lumistone", None);
    b.register_kind("scaleplate", Some(HerbFamily::Overworld));
    b.register_kind("dewpetal_shard", Some(HerbFamily::Overworld));
    b.register_kind("golden_lilybell", Some(HerbFamily::Overworld));
    b.register_kind("cryst_spine", Some(HerbFamily::NetherOrEnd));
    b.register_kind("burnt_node", Some(HerbFamily::NetherOrEnd));
    b.register_kind("heart_of_stardream", Some(HerbFamily::NetherOrEnd));
    b.register_kind("flowweave_ring", None);
    b.register_kind("gold_ingot", None);
    b.register_kind("blessed_gold", None);
    b.register_kind("polished_lumistone", None);
    b.register_effect("regeneration", 2);
    b.register_effect("speed", 4);
    b
}

/// Registry with two brewing recipes, one transform, and two infusions.
///
/// Recipe order: `regeneration_brew`, `speed_brew`, `bless_gold`,
/// `soak_lumistone`, `bind_ring`.
pub fn brewing_registry() -> Registry {
    let mut b = fixture_builder();
    b.register_recipe(Recipe::Brewing(BrewingRecipe {
        name: "regeneration_brew".to_string(),
        materials: vec![Ingredient::new(ash(), 2)],
        effect: regeneration(),
        color: REGEN_COLOR,
        rates: HerbRates::default(),
    }));
    b.register_recipe(Recipe::Brewing(BrewingRecipe {
        name: "speed_brew".to_string(),
        materials: vec![Ingredient::new(ash(), 1), Ingredient::new(lumistone(), 1)],
        effect: speed(),
        color: SPEED_COLOR,
        rates: HerbRates::default(),
    }));
    b.register_recipe(Recipe::Transform(TransformRecipe::new(
        "bless_gold",
        Ingredient::new(gold_ingot(), 2),
        PotionPredicate {
            effect: Some(regeneration()),
            ..PotionPredicate::default()
        },
        ResourceStack::new(blessed_gold(), 1),
    )));
    b.register_recipe(Recipe::Infusing(InfusingRecipe {
        name: "soak_lumistone".to_string(),
        inputs: vec![Ingredient::new(lumistone(), 1)],
        potion: PotionPredicate::default(),
        output: InfusingOutput::Item(ResourceStack::new(polished_lumistone(), 1)),
    }));
    b.register_recipe(Recipe::Infusing(InfusingRecipe {
        name: "bind_ring".to_string(),
        inputs: vec![Ingredient::new(flowweave_ring(), 1)],
        potion: PotionPredicate::default(),
        output: InfusingOutput::BindPotion,
    }));
    b.build().expect("fixture registry must build")
}

/// The regeneration brew plus a two-kind infusion ahead of `soak_lumistone`.
///
/// `gild_lumistone` takes 2 gold ingots and 1 lumistone in a regeneration
/// potion and yields 1 blessed gold. No transform recipes are registered.
pub fn two_kind_infusing_registry() -> Registry {
    let mut b = fixture_builder();
    b.register_recipe(Recipe::Brewing(BrewingRecipe {
        name: "regeneration_brew".to_string(),
        materials: vec![Ingredient::new(ash(), 2)],
        effect: regeneration(),
        color: REGEN_COLOR,
        rates: HerbRates::default(),
    }));
    b.register_recipe(Recipe::Infusing(InfusingRecipe {
        name: "gild_lumistone".to_string(),
        inputs: vec![Ingredient::new(gold_ingot(), 2), Ingredient::new(lumistone(), 1)],
        potion: PotionPredicate {
            effect: Some(regeneration()),
            ..PotionPredicate::default()
        },
        output: InfusingOutput::Item(ResourceStack::new(blessed_gold(), 1)),
    }));
    b.register_recipe(Recipe::Infusing(InfusingRecipe {
        name: "soak_lumistone".to_string(),
        inputs: vec![Ingredient::new(lumistone(), 1)],
        potion: PotionPredicate::default(),
        output: InfusingOutput::Item(ResourceStack::new(polished_lumistone(), 1)),
    }));
    b.build().expect("fixture registry must build")
}

/// A finished potion of `effect` at base duration and level 1.
pub fn finished_potion(effect: EffectId) -> PotionProperties {
    PotionProperties {
        color: REGEN_COLOR,
        duration_seconds: 120,
        level: 1,
        effect: Some(effect),
    }
}
