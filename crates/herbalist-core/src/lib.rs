//! Herbalist Core -- the simulation core of a multi-cell brewing station.
//!
//! This crate owns everything that happens inside a station once its
//! structure has formed: capacity-bounded resource ledgers, recipe
//! resolution, derived potion properties, and the phase state machine that
//! ties them together. Structure geometry lives in `herbalist-structure`.
//!
//! # Station Lifecycle
//!
//! 1. **Empty** -- no fluid. `add_primary_fluid` fills it.
//! 2. **Water** -- materials are added (and taken back, last first).
//! 3. **Brewing** -- started with heat; herbs are added while heated ticks
//!    accumulate toward the finishing threshold.
//! 4. **Complete** -- the potion is final. One item at a time may be
//!    transformed or infused, then extracted, which empties the station.
//!
//! # Key Types
//!
//! - [`station::BrewingStation`] -- the master cell's plain state record.
//! - [`machine::PhaseStateMachine`] -- guarded transitions over a station.
//! - [`ledger::OrderedSlotList`] / [`ledger::CountedMap`] -- materials and herbs.
//! - [`matcher::RecipeMatcher`] -- first-match lookup over a [`registry::Registry`].
//! - [`property`] -- pure calculators for color, duration, and level.
//! - [`serialize`] -- tolerant persistence via a named logical schema.

pub mod config;
pub mod event;
pub mod fixed;
pub mod id;
pub mod item;
pub mod ledger;
pub mod machine;
pub mod matcher;
pub mod property;
pub mod recipe;
pub mod registry;
pub mod serialize;
pub mod station;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
