//! First-match recipe resolution over an explicit registry.

use crate::id::{KindId, RecipeId};
use crate::item::ResourceStack;
use crate::ledger::OrderedSlotList;
use crate::property::PotionProperties;
use crate::recipe::{BrewingRecipe, InfusingRecipe, MatchStrategy, TransformRecipe};
use crate::registry::Registry;
use std::collections::BTreeMap;

/// Looks up recipes in registration order. The first match wins.
#[derive(Debug, Clone, Copy)]
pub struct RecipeMatcher<'a> {
    registry: &'a Registry,
}

impl<'a> RecipeMatcher<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Brewing recipe whose materials equal the slot list as a multiset.
    pub fn find_brewing(
        &self,
        materials: &OrderedSlotList,
    ) -> Option<(RecipeId, &'a BrewingRecipe)> {
        let have = materials.histogram();
        self.registry
            .brewing_recipes()
            .find(|(_, r)| MatchStrategy::ExactMultiset.matches(&r.materials, &have))
    }

    /// Transform recipe for `input`: same kind, enough units, and a potion
    /// the recipe accepts.
    pub fn find_transform(
        &self,
        input: &ResourceStack,
        potion: &PotionProperties,
    ) -> Option<(RecipeId, &'a TransformRecipe)> {
        let have = single(input);
        self.registry.transform_recipes().find(|(_, r)| {
            r.input.kind == input.kind
                && MatchStrategy::AtLeast.matches(&[r.input], &have)
                && r.potion.matches(potion)
        })
    }

    /// Infusing recipe whose input kinds equal the kinds staged in the
    /// potion, with a potion predicate that accepts `potion`.
    pub fn find_infusing(
        &self,
        staged: &OrderedSlotList,
        potion: &PotionProperties,
    ) -> Option<(RecipeId, &'a InfusingRecipe)> {
        let have = staged.histogram();
        self.registry.infusing_recipes().find(|(_, r)| {
            MatchStrategy::KindSet.matches(&r.inputs, &have) && r.potion.matches(potion)
        })
    }

    /// First infusing recipe that still fits once `kind` joins the staged
    /// kinds, with the units of `kind` it asks for.
    pub fn infusing_demand(
        &self,
        staged: &OrderedSlotList,
        kind: KindId,
        potion: &PotionProperties,
    ) -> Option<(RecipeId, &'a InfusingRecipe, u32)> {
        self.registry.infusing_recipes().find_map(|(id, r)| {
            let need: u32 = r
                .inputs
                .iter()
                .filter(|i| i.kind == kind)
                .map(|i| i.count)
                .sum();
            let fits = staged.iter().all(|s| r.inputs.iter().any(|i| i.kind == s.kind));
            (need > 0 && fits && r.potion.matches(potion)).then_some((id, r, need))
        })
    }
}

fn single(stack: &ResourceStack) -> BTreeMap<KindId, u32> {
    BTreeMap::from([(stack.kind, stack.count)])
}
