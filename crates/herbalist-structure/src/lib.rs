//! Herbalist Structure -- multiblock geometry around brewing stations.
//!
//! A cauldron is a 3x3x2 footprint of bricks and slabs. Forming it turns
//! every footprint position into a [`cell::StructureCell`] that stores only
//! its offset from the master; the master alone owns a
//! [`herbalist_core::station::BrewingStation`]. Any cell can be used to read
//! or drive the station, and destroying any cell takes the whole structure
//! apart, restoring the original blocks and ejecting the station contents.

pub mod cell;
pub mod heat;
pub mod lifecycle;
pub mod persist;
pub mod shape;
pub mod world;

pub use cell::{Block, BlockKind, CellPos, Facing, Offset, PartBlock, StructureCell, StructureKind};
pub use heat::GridHeat;
pub use lifecycle::{Disassembly, FormationError};
pub use persist::{PersistedCell, SavedBlock, SavedStation, SavedWorld};
pub use world::{MasterHandle, World};
