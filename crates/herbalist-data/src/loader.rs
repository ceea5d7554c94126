//! Reads content files, resolves names, and builds the registry.
//!
//! A content directory holds `kinds`, `effects` (required), `recipes`, and
//! `station` (optional), each as `.ron`, `.toml`, or `.json`.

use crate::schema::{
    EffectData, IngredientData, InfusingOutputData, KindData, PotionPredicateData, RecipesData,
};
use herbalist_core::config::StationConfig;
use herbalist_core::id::{EffectId, KindId};
use herbalist_core::item::ResourceStack;
use herbalist_core::recipe::{
    BrewingRecipe, InfusingOutput, InfusingRecipe, Ingredient, PotionPredicate, Recipe,
    TransformRecipe,
};
use herbalist_core::registry::{Registry, RegistryBuilder, RegistryError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection and discovery
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Find `{base_name}.{ron,toml,json}` in `dir`. Two formats of the same
/// file is an error.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = &found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing.clone(),
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read and deserialize a file according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so there the list sits
/// under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution
// ===========================================================================

struct Names<'a> {
    kinds: HashMap<String, KindId>,
    effects: HashMap<String, EffectId>,
    file: &'a Path,
}

impl Names<'_> {
    fn kind(&self, name: &str) -> Result<KindId, DataLoadError> {
        self.kinds
            .get(name)
            .copied()
            .ok_or_else(|| self.unresolved(name, "kind"))
    }

    fn effect(&self, name: &str) -> Result<EffectId, DataLoadError> {
        self.effects
            .get(name)
            .copied()
            .ok_or_else(|| self.unresolved(name, "effect"))
    }

    fn unresolved(&self, name: &str, expected_kind: &'static str) -> DataLoadError {
        DataLoadError::UnresolvedRef {
            file: self.file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        }
    }

    fn ingredient(&self, data: &IngredientData) -> Result<Ingredient, DataLoadError> {
        Ok(Ingredient::new(self.kind(data.kind())?, data.count()))
    }

    fn stack(&self, data: &IngredientData) -> Result<ResourceStack, DataLoadError> {
        Ok(ResourceStack::new(self.kind(data.kind())?, data.count()))
    }

    fn predicate(&self, data: &PotionPredicateData) -> Result<PotionPredicate, DataLoadError> {
        Ok(PotionPredicate {
            effect: data.effect.as_deref().map(|e| self.effect(e)).transpose()?,
            min_duration: data.min_duration,
            min_level: data.min_level,
        })
    }
}

fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn resolve_recipes(
    data: RecipesData,
    names: &Names<'_>,
    builder: &mut RegistryBuilder,
) -> Result<(), DataLoadError> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut claim = |name: &str| -> Result<(), DataLoadError> {
        check_duplicate(&seen, name, names.file)?;
        seen.insert(name.to_string(), ());
        Ok(())
    };

    for b in data.brewing {
        claim(&b.name)?;
        let materials = b
            .materials
            .iter()
            .map(|i| names.ingredient(i))
            .collect::<Result<Vec<_>, _>>()?;
        builder.register_recipe(Recipe::Brewing(BrewingRecipe {
            effect: names.effect(&b.effect)?,
            name: b.name,
            materials,
            color: b.color,
            rates: b.rates,
        }));
    }
    for r in data.infusing {
        claim(&r.name)?;
        let inputs = r
            .inputs
            .iter()
            .map(|i| names.ingredient(i))
            .collect::<Result<Vec<_>, _>>()?;
        let output = match &r.output {
            InfusingOutputData::Item(stack) => InfusingOutput::Item(names.stack(stack)?),
            InfusingOutputData::BindPotion => InfusingOutput::BindPotion,
            InfusingOutputData::Unbind => InfusingOutput::Unbind,
        };
        builder.register_recipe(Recipe::Infusing(InfusingRecipe {
            potion: names.predicate(&r.potion)?,
            name: r.name,
            inputs,
            output,
        }));
    }
    for t in data.transform {
        claim(&t.name)?;
        builder.register_recipe(Recipe::Transform(TransformRecipe {
            input: names.ingredient(&t.input)?,
            potion: names.predicate(&t.potion)?,
            output: names.stack(&t.output)?,
            processing_ticks: t.processing_ticks,
            name: t.name,
        }));
    }
    Ok(())
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load every content file in `dir` into a ready registry.
pub fn load_registry(dir: &Path) -> Result<Registry, DataLoadError> {
    let mut builder = RegistryBuilder::new();

    let kinds_path = require_data_file(dir, "kinds")?;
    let kinds: Vec<KindData> = deserialize_list(&kinds_path, "kinds")?;
    let mut kind_ids = HashMap::new();
    for k in &kinds {
        check_duplicate(&kind_ids, &k.name, &kinds_path)?;
        let id = builder.register_kind(&k.name, k.herb.map(Into::into));
        kind_ids.insert(k.name.clone(), id);
    }

    let effects_path = require_data_file(dir, "effects")?;
    let effects: Vec<EffectData> = deserialize_list(&effects_path, "effects")?;
    let mut effect_ids = HashMap::new();
    for e in &effects {
        check_duplicate(&effect_ids, &e.name, &effects_path)?;
        let id = builder.register_effect(&e.name, e.max_level);
        effect_ids.insert(e.name.clone(), id);
    }

    if let Some(recipes_path) = find_data_file(dir, "recipes")? {
        let data: RecipesData = deserialize_file(&recipes_path)?;
        let names = Names {
            kinds: kind_ids,
            effects: effect_ids,
            file: &recipes_path,
        };
        resolve_recipes(data, &names, &mut builder)?;
    }

    if let Some(station_path) = find_data_file(dir, "station")? {
        let config: StationConfig = deserialize_file(&station_path)?;
        builder.set_station_config(config);
    }

    let registry = builder.build()?;
    tracing::debug!(
        kinds = registry.kind_count(),
        effects = registry.effect_count(),
        recipes = registry.recipe_count(),
        dir = %dir.display(),
        "content loaded"
    );
    Ok(registry)
}

// ===========================================================================
// Tests
// ===========================================================================
