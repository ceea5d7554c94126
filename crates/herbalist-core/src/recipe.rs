//! Recipe shapes and the matching strategies used to resolve them.
//!
//! Recipes are plain immutable data. All three families live in one closed
//! [`Recipe`] enum so lookups can match exhaustively.

use crate::config::DEFAULT_TRANSFORM_TICKS;
use crate::fixed::Ticks;
use crate::id::{EffectId, KindId};
use crate::item::ResourceStack;
use crate::property::{HerbRates, PotionProperties};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A required kind and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ingredient {
    pub kind: KindId,
    pub count: u32,
}

impl Ingredient {
    pub fn new(kind: KindId, count: u32) -> Self {
        Self { kind, count }
    }
}

/// Condition on the station's finished potion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PotionPredicate {
    /// Required effect. `None` accepts any potion, brewed with or without a recipe.
    #[serde(default)]
    pub effect: Option<EffectId>,
    #[serde(default)]
    pub min_duration: u32,
    #[serde(default)]
    pub min_level: u32,
}

impl PotionPredicate {
    pub fn matches(&self, potion: &PotionProperties) -> bool {
        if self.effect.is_some_and(|e| potion.effect != Some(e)) {
            return false;
        }
        potion.duration_seconds >= self.min_duration && potion.level >= self.min_level
    }
}

// ---------------------------------------------------------------------------
// Recipe families
// ---------------------------------------------------------------------------

/// Turns a set of materials into a potion effect. Matched by exact multiset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewingRecipe {
    pub name: String,
    pub materials: Vec<Ingredient>,
    pub effect: EffectId,
    pub color: u32,
    #[serde(default)]
    pub rates: HerbRates,
}

/// What an infusing recipe produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfusingOutput {
    /// A fixed item.
    Item(ResourceStack),
    /// The input item stamped with the station's potion and herb cost.
    BindPotion,
    /// The input kind with every property stripped.
    Unbind,
}

/// Soaks an item in the finished potion. Matched by kind-set equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfusingRecipe {
    pub name: String,
    pub inputs: Vec<Ingredient>,
    #[serde(default)]
    pub potion: PotionPredicate,
    pub output: InfusingOutput,
}

/// Processes an item in the finished potion over time. Input counts are
/// matched greedily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRecipe {
    pub name: String,
    pub input: Ingredient,
    #[serde(default)]
    pub potion: PotionPredicate,
    pub output: ResourceStack,
    pub processing_ticks: Ticks,
}

impl TransformRecipe {
    pub fn new(
        name: &str,
        input: Ingredient,
        potion: PotionPredicate,
        output: ResourceStack,
    ) -> Self {
        Self {
            name: name.to_string(),
            input,
            potion,
            output,
            processing_ticks: DEFAULT_TRANSFORM_TICKS,
        }
    }
}

/// Every recipe family the station understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipe {
    Brewing(BrewingRecipe),
    Infusing(InfusingRecipe),
    Transform(TransformRecipe),
}

impl Recipe {
    pub fn name(&self) -> &str {
        match self {
            Recipe::Brewing(r) => &r.name,
            Recipe::Infusing(r) => &r.name,
            Recipe::Transform(r) => &r.name,
        }
    }

    /// Every kind referenced as an input or output.
    pub fn referenced_kinds(&self) -> Vec<KindId> {
        match self {
            Recipe::Brewing(r) => r.materials.iter().map(|i| i.kind).collect(),
            Recipe::Infusing(r) => {
                let mut kinds: Vec<KindId> = r.inputs.iter().map(|i| i.kind).collect();
                if let InfusingOutput::Item(stack) = &r.output {
                    kinds.push(stack.kind);
                }
                kinds
            }
            Recipe::Transform(r) => vec![r.input.kind, r.output.kind],
        }
    }

    /// Every effect referenced by the recipe or its potion predicate.
    pub fn referenced_effects(&self) -> Vec<EffectId> {
        match self {
            Recipe::Brewing(r) => vec![r.effect],
            Recipe::Infusing(r) => r.potion.effect.into_iter().collect(),
            Recipe::Transform(r) => r.potion.effect.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching strategies
// ---------------------------------------------------------------------------

/// How required ingredients are compared against available resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Same kinds with the same total per kind.
    ExactMultiset,
    /// Same set of distinct kinds; counts ignored.
    KindSet,
    /// At least the required count of each kind.
    AtLeast,
}

impl MatchStrategy {
    pub fn matches(self, required: &[Ingredient], available: &BTreeMap<KindId, u32>) -> bool {
        match self {
            MatchStrategy::ExactMultiset => matches_exact(required, available),
            MatchStrategy::KindSet => matches_kinds(required, available),
            MatchStrategy::AtLeast => matches_at_least(required, available),
        }
    }
}

/// Collapse ingredients into kind -> total. Zero counts are dropped.
pub fn histogram(ingredients: &[Ingredient]) -> BTreeMap<KindId, u32> {
    let mut out = BTreeMap::new();
    for i in ingredients.iter().filter(|i| i.count > 0) {
        *out.entry(i.kind).or_insert(0) += i.count;
    }
    out
}

fn nonzero(available: &BTreeMap<KindId, u32>) -> BTreeMap<KindId, u32> {
    available
        .iter()
        .filter(|&(_, &c)| c > 0)
        .map(|(&k, &c)| (k, c))
        .collect()
}

/// Histogram equality. Repeated ingredient entries are summed first.
pub fn matches_exact(required: &[Ingredient], available: &BTreeMap<KindId, u32>) -> bool {
    !required.is_empty() && histogram(required) == nonzero(available)
}

/// Distinct-kind set equality.
pub fn matches_kinds(required: &[Ingredient], available: &BTreeMap<KindId, u32>) -> bool {
    let want: BTreeSet<KindId> = required.iter().map(|i| i.kind).collect();
    let have: BTreeSet<KindId> = nonzero(available).into_keys().collect();
    !want.is_empty() && want == have
}

/// Deduct each requirement, in declaration order, from a working copy.
pub fn matches_at_least(required: &[Ingredient], available: &BTreeMap<KindId, u32>) -> bool {
    let mut working = available.clone();
    for req in required {
        match working.get_mut(&req.kind) {
            Some(have) if *have >= req.count => *have -= req.count,
            _ => return false,
        }
    }
    true
}
