//! Serde data file structs for brewing content.
//!
//! Everything references other entries by name; the loader resolves names
//! into registry ids.

use herbalist_core::config::DEFAULT_TRANSFORM_TICKS;
use herbalist_core::fixed::Ticks;
use herbalist_core::property::HerbRates;
use herbalist_core::registry::{DEFAULT_MAX_LEVEL, HerbFamily};
use serde::Deserialize;

// ===========================================================================
// Kinds and effects
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HerbFamilyData {
    Overworld,
    NetherOrEnd,
}

impl From<HerbFamilyData> for HerbFamily {
    fn from(f: HerbFamilyData) -> Self {
        match f {
            HerbFamilyData::Overworld => HerbFamily::Overworld,
            HerbFamilyData::NetherOrEnd => HerbFamily::NetherOrEnd,
        }
    }
}

/// A resource kind. `herb` marks it as addable while brewing.
#[derive(Debug, Clone, Deserialize)]
pub struct KindData {
    pub name: String,
    #[serde(default)]
    pub herb: Option<HerbFamilyData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EffectData {
    pub name: String,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
}

fn default_max_level() -> u32 {
    DEFAULT_MAX_LEVEL
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A kind and count, as `("ash", 2)` or `{ kind = "ash", count = 2 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    Short(String, u32),
    Full {
        kind: String,
        #[serde(default = "default_count")]
        count: u32,
    },
}

fn default_count() -> u32 {
    1
}

impl IngredientData {
    pub fn kind(&self) -> &str {
        match self {
            IngredientData::Short(kind, _) | IngredientData::Full { kind, .. } => kind,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            IngredientData::Short(_, count) | IngredientData::Full { count, .. } => *count,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PotionPredicateData {
    pub effect: Option<String>,
    pub min_duration: u32,
    pub min_level: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrewingData {
    pub name: String,
    pub materials: Vec<IngredientData>,
    pub effect: String,
    pub color: u32,
    #[serde(default)]
    pub rates: HerbRates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfusingOutputData {
    Item(IngredientData),
    BindPotion,
    Unbind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfusingData {
    pub name: String,
    pub inputs: Vec<IngredientData>,
    #[serde(default)]
    pub potion: PotionPredicateData,
    pub output: InfusingOutputData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformData {
    pub name: String,
    pub input: IngredientData,
    #[serde(default)]
    pub potion: PotionPredicateData,
    pub output: IngredientData,
    #[serde(default = "default_transform_ticks")]
    pub processing_ticks: Ticks,
}

fn default_transform_ticks() -> Ticks {
    DEFAULT_TRANSFORM_TICKS
}

/// The recipes file. Families register in the order listed here, and
/// within a family in file order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipesData {
    pub brewing: Vec<BrewingData>,
    pub infusing: Vec<InfusingData>,
    pub transform: Vec<TransformData>,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TomlKinds {
    pub kinds: Vec<KindData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlEffects {
    pub effects: Vec<EffectData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_herb_family_snake_case() {
        let k: KindData =
            serde_json::from_str(r#"{"name": "burnt_node", "herb": "nether_or_end"}"#).unwrap();
        assert_eq!(k.herb, Some(HerbFamilyData::NetherOrEnd));
        let plain: KindData = ron::from_str(r#"(name: "ash")"#).unwrap();
        assert_eq!(plain.herb, None);
    }

    #[test]
    fn effect_max_level_defaults() {
        let e: EffectData = ron::from_str(r#"(name: "speed")"#).unwrap();
        assert_eq!(e.max_level, DEFAULT_MAX_LEVEL);
    }

    #[test]
    fn ingredient_short_and_full_forms() {
        let short: IngredientData = serde_json::from_str(r#"["ash", 2]"#).unwrap();
        assert_eq!((short.kind(), short.count()), ("ash", 2));
        let full: IngredientData = serde_json::from_str(r#"{"kind": "ash"}"#).unwrap();
        assert_eq!((full.kind(), full.count()), ("ash", 1));
    }

    #[test]
    fn brewing_rates_partially_specified() {
        let b: BrewingData = ron::from_str(
            r#"(
                name: "speed_brew",
                materials: [("ash", 1), ("lumistone", 1)],
                effect: "speed",
                color: 8171462,
                rates: (max_duration: 600),
            )"#,
        )
        .unwrap();
        assert_eq!(b.rates.max_duration, 600);
        assert_eq!(b.rates.base_duration, HerbRates::default().base_duration);
    }

    #[test]
    fn recipes_toml_tables() {
        let r: RecipesData = toml::from_str(
            r#"
[[transform]]
name = "bless_gold"
input = ["gold_ingot", 2]
output = ["blessed_gold", 1]
potion = { effect = "regeneration" }

[[infusing]]
name = "bind_ring"
inputs = [["flowweave_ring", 1]]
output = "bind_potion"
"#,
        )
        .unwrap();
        assert!(r.brewing.is_empty());
        assert_eq!(r.transform[0].processing_ticks, DEFAULT_TRANSFORM_TICKS);
        assert_eq!(r.transform[0].potion.effect.as_deref(), Some("regeneration"));
        assert!(matches!(r.infusing[0].output, InfusingOutputData::BindPotion));
    }
}
