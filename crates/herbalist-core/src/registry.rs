use crate::config::StationConfig;
use crate::id::*;
use crate::recipe::{BrewingRecipe, InfusingRecipe, Recipe, TransformRecipe, histogram};
use std::collections::HashMap;

/// Default cap on potion level for an effect.
pub const DEFAULT_MAX_LEVEL: u32 = 4;

/// Which herb family a kind belongs to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HerbFamily {
    /// Extends potion duration.
    Overworld,
    /// Raises potion level.
    NetherOrEnd,
}

/// A resource kind definition.
#[derive(Debug, Clone)]
pub struct KindDef {
    pub name: String,
    pub herb: Option<HerbFamily>,
}

/// A potion effect definition.
#[derive(Debug, Clone)]
pub struct EffectDef {
    pub name: String,
    /// Highest level a brew of this effect can reach.
    pub max_level: u32,
}

/// Builder for constructing an immutable Registry.
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    kinds: Vec<KindDef>,
    kind_name_to_id: HashMap<String, KindId>,
    effects: Vec<EffectDef>,
    effect_name_to_id: HashMap<String, EffectId>,
    recipes: Vec<Recipe>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    station: StationConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a resource kind. Returns its ID.
    pub fn register_kind(&mut self, name: &str, herb: Option<HerbFamily>) -> KindId {
        let id = KindId(self.kinds.len() as u32);
        self.kinds.push(KindDef {
            name: name.to_string(),
            herb,
        });
        self.kind_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Phase 1: Register a potion effect. Returns its ID.
    pub fn register_effect(&mut self, name: &str, max_level: u32) -> EffectId {
        let id = EffectId(self.effects.len() as u32);
        self.effects.push(EffectDef {
            name: name.to_string(),
            max_level,
        });
        self.effect_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Phase 1: Register a recipe. Registration order is match priority.
    pub fn register_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(recipe.name().to_string(), id);
        self.recipes.push(recipe);
        id
    }

    /// Phase 1: Replace the station tuning.
    pub fn set_station_config(&mut self, config: StationConfig) {
        self.station = config;
    }

    /// Phase 2: Mutate an existing recipe by name.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Recipe),
    {
        let id = self
            .recipe_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    /// Lookup kind ID by name.
    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.kind_name_to_id.get(name).copied()
    }

    /// Lookup effect ID by name.
    pub fn effect_id(&self, name: &str) -> Option<EffectId> {
        self.effect_name_to_id.get(name).copied()
    }

    /// Lookup recipe ID by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Phase 3: Finalize and build the immutable registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(field) = self.station.first_invalid_field() {
            return Err(RegistryError::InvalidConfig(field));
        }
        for recipe in &self.recipes {
            for kind in recipe.referenced_kinds() {
                if kind.0 as usize >= self.kinds.len() {
                    return Err(RegistryError::InvalidKindRef {
                        recipe: recipe.name().to_string(),
                        kind,
                    });
                }
            }
            for effect in recipe.referenced_effects() {
                if effect.0 as usize >= self.effects.len() {
                    return Err(RegistryError::InvalidEffectRef {
                        recipe: recipe.name().to_string(),
                        effect,
                    });
                }
            }
        }

        let registry = Registry {
            kinds: self.kinds,
            kind_name_to_id: self.kind_name_to_id,
            effects: self.effects,
            effect_name_to_id: self.effect_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            station: self.station,
        };
        for (first, shadowed) in registry.shadowed_brewing_recipes() {
            tracing::warn!(
                first = registry.recipe_name(first),
                shadowed = registry.recipe_name(shadowed),
                "brewing recipes share a material multiset; the earlier one always wins"
            );
        }
        Ok(registry)
    }
}

/// Immutable registry. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Registry {
    kinds: Vec<KindDef>,
    kind_name_to_id: HashMap<String, KindId>,
    effects: Vec<EffectDef>,
    effect_name_to_id: HashMap<String, EffectId>,
    recipes: Vec<Recipe>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    station: StationConfig,
}

impl Registry {
    pub fn get_kind(&self, id: KindId) -> Option<&KindDef> {
        self.kinds.get(id.0 as usize)
    }

    pub fn get_effect(&self, id: EffectId) -> Option<&EffectDef> {
        self.effects.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.0 as usize)
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.kind_name_to_id.get(name).copied()
    }

    pub fn effect_id(&self, name: &str) -> Option<EffectId> {
        self.effect_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn kind_name(&self, id: KindId) -> &str {
        self.get_kind(id).map_or("", |k| k.name.as_str())
    }

    pub fn effect_name(&self, id: EffectId) -> &str {
        self.get_effect(id).map_or("", |e| e.name.as_str())
    }

    pub fn recipe_name(&self, id: RecipeId) -> &str {
        self.get_recipe(id).map_or("", |r| r.name())
    }

    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn station_config(&self) -> &StationConfig {
        &self.station
    }

    pub fn herb_family(&self, kind: KindId) -> Option<HerbFamily> {
        self.get_kind(kind).and_then(|k| k.herb)
    }

    pub fn is_herb(&self, kind: KindId) -> bool {
        self.herb_family(kind).is_some()
    }

    /// Level cap for an effect. Unknown or absent effects use the default cap.
    pub fn max_level(&self, effect: Option<EffectId>) -> u32 {
        effect
            .and_then(|e| self.get_effect(e))
            .map_or(DEFAULT_MAX_LEVEL, |e| e.max_level)
    }

    /// All recipes in registration order.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    pub fn brewing_recipes(&self) -> impl Iterator<Item = (RecipeId, &BrewingRecipe)> {
        self.recipes().filter_map(|(id, r)| match r {
            Recipe::Brewing(b) => Some((id, b)),
            _ => None,
        })
    }

    pub fn infusing_recipes(&self) -> impl Iterator<Item = (RecipeId, &InfusingRecipe)> {
        self.recipes().filter_map(|(id, r)| match r {
            Recipe::Infusing(i) => Some((id, i)),
            _ => None,
        })
    }

    pub fn transform_recipes(&self) -> impl Iterator<Item = (RecipeId, &TransformRecipe)> {
        self.recipes().filter_map(|(id, r)| match r {
            Recipe::Transform(t) => Some((id, t)),
            _ => None,
        })
    }

    /// Pairs of brewing recipes with identical material multisets, as
    /// `(winner, shadowed)`.
    pub fn shadowed_brewing_recipes(&self) -> Vec<(RecipeId, RecipeId)> {
        let brewing: Vec<_> = self
            .brewing_recipes()
            .map(|(id, r)| (id, histogram(&r.materials)))
            .collect();
        let mut out = Vec::new();
        for (i, (later_id, later)) in brewing.iter().enumerate() {
            if let Some((first_id, _)) = brewing[..i].iter().find(|(_, h)| h == later) {
                out.push((*first_id, *later_id));
            }
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("recipe {recipe:?} references unknown kind {kind:?}")]
    InvalidKindRef { recipe: String, kind: KindId },
    #[error("recipe {recipe:?} references unknown effect {effect:?}")]
    InvalidEffectRef { recipe: String, effect: EffectId },
    #[error("invalid station config: {0} must be non-zero")]
    InvalidConfig(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ResourceStack;
    use crate::property::HerbRates;
    use crate::recipe::{Ingredient, PotionPredicate};

    fn brewing(name: &str, materials: Vec<Ingredient>, effect: EffectId) -> Recipe {
        Recipe::Brewing(BrewingRecipe {
            name: name.to_string(),
            materials,
            effect,
            color: 0xCD5CAB,
            rates: HerbRates::default(),
        })
    }

    fn setup_builder() -> RegistryBuilder {
        let mut b = RegistryBuilder::new();
        let ash = b.register_kind("ash", None);
        b.register_kind("scaleplate", Some(HerbFamily::Overworld));
        b.register_kind("burnt_node", Some(HerbFamily::NetherOrEnd));
        let regen = b.register_effect("regeneration", 2);
        b.register_recipe(brewing("regen", vec![Ingredient::new(ash, 2)], regen));
        b
    }

    #[test]
    fn register_and_build() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.kind_count(), 3);
        assert_eq!(reg.effect_count(), 1);
        assert_eq!(reg.recipe_count(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.kind_id("scaleplate"), Some(KindId(1)));
        assert!(reg.kind_id("nonexistent").is_none());
        assert_eq!(reg.kind_name(KindId(2)), "burnt_node");
        assert_eq!(reg.recipe_name(RecipeId(0)), "regen");
    }

    #[test]
    fn herb_families() {
        let reg = setup_builder().build().unwrap();
        assert!(!reg.is_herb(KindId(0)));
        assert_eq!(reg.herb_family(KindId(1)), Some(HerbFamily::Overworld));
        assert_eq!(reg.herb_family(KindId(2)), Some(HerbFamily::NetherOrEnd));
        assert!(!reg.is_herb(KindId(99)));
    }

    #[test]
    fn max_level_falls_back_to_default() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.max_level(Some(EffectId(0))), 2);
        assert_eq!(reg.max_level(None), DEFAULT_MAX_LEVEL);
        assert_eq!(reg.max_level(Some(EffectId(42))), DEFAULT_MAX_LEVEL);
    }

    #[test]
    fn mutate_recipe() {
        let mut b = setup_builder();
        let extra = b.register_kind("lumistone", None);
        b.mutate_recipe("regen", |r| {
            if let Recipe::Brewing(brew) = r {
                brew.materials.push(Ingredient::new(extra, 1));
            }
        })
        .unwrap();
        let reg = b.build().unwrap();
        match reg.get_recipe(RecipeId(0)) {
            Some(Recipe::Brewing(brew)) => assert_eq!(brew.materials.len(), 2),
            other => panic!("expected brewing recipe, got: {other:?}"),
        }
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut b = setup_builder();
        match b.mutate_recipe("nonexistent", |_| {}) {
            Err(RegistryError::NotFound(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_kind_ref_fails() {
        let mut b = RegistryBuilder::new();
        let e = b.register_effect("speed", 4);
        b.register_recipe(brewing("bad", vec![Ingredient::new(KindId(999), 1)], e));
        match b.build() {
            Err(RegistryError::InvalidKindRef { recipe, kind }) => {
                assert_eq!(recipe, "bad");
                assert_eq!(kind, KindId(999));
            }
            other => panic!("expected InvalidKindRef, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_effect_ref_in_predicate_fails() {
        let mut b = RegistryBuilder::new();
        let a = b.register_kind("a", None);
        b.register_recipe(Recipe::Transform(crate::recipe::TransformRecipe::new(
            "t",
            Ingredient::new(a, 1),
            PotionPredicate {
                effect: Some(EffectId(7)),
                ..PotionPredicate::default()
            },
            ResourceStack::new(a, 1),
        )));
        let err = b.build().unwrap_err();
        assert!(format!("{err}").contains("unknown effect"), "got: {err}");
    }

    #[test]
    fn invalid_station_config_fails() {
        let mut b = setup_builder();
        b.set_station_config(StationConfig {
            sync_interval: 0,
            ..StationConfig::default()
        });
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidConfig("sync_interval"))
        ));
    }

    #[test]
    fn shadowed_brewing_recipes_are_reported() {
        let mut b = setup_builder();
        let ash = b.kind_id("ash").unwrap();
        let regen = b.effect_id("regeneration").unwrap();
        b.register_recipe(brewing("regen_again", vec![Ingredient::new(ash, 2)], regen));
        let reg = b.build().unwrap();
        assert_eq!(
            reg.shadowed_brewing_recipes(),
            vec![(RecipeId(0), RecipeId(1))]
        );
    }

    #[test]
    fn family_iterators_keep_registration_order() {
        let mut b = setup_builder();
        let ash = b.kind_id("ash").unwrap();
        b.register_recipe(Recipe::Transform(crate::recipe::TransformRecipe::new(
            "t",
            Ingredient::new(ash, 1),
            PotionPredicate::default(),
            ResourceStack::new(ash, 1),
        )));
        let regen = b.effect_id("regeneration").unwrap();
        b.register_recipe(brewing("second", vec![Ingredient::new(ash, 3)], regen));
        let reg = b.build().unwrap();
        let ids: Vec<_> = reg.brewing_recipes().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![RecipeId(0), RecipeId(2)]);
        assert_eq!(reg.transform_recipes().count(), 1);
        assert_eq!(reg.infusing_recipes().count(), 0);
    }

    #[test]
    fn empty_registry_builds_successfully() {
        let reg = RegistryBuilder::new().build().unwrap();
        assert_eq!(reg.kind_count(), 0);
        assert_eq!(reg.recipe_count(), 0);
        assert_eq!(*reg.station_config(), StationConfig::default());
    }
}
