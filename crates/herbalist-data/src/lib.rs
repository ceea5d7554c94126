//! Content loading for brewing stations.
//!
//! Kinds, effects, recipes, and an optional station config are read from
//! RON, TOML, or JSON files in one directory and resolved by name into a
//! [`herbalist_core::registry::Registry`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_registry};
