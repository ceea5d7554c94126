//! Persisted form of a world: named blocks, structure cells, and stations.
//!
//! Restoring follows the same rule as station persistence: anything
//! malformed degrades to a default and is logged, never rejected.

use crate::cell::{
    Block, BlockKind, CellPos, Facing, Offset, PartBlock, StructureCell, StructureKind,
};
use crate::shape;
use crate::world::{DEFAULT_MAX_Y, DEFAULT_MIN_Y, World};
use herbalist_core::event::EventBuffer;
use herbalist_core::registry::Registry;
use herbalist_core::serialize::PersistedStation;
use herbalist_core::station::BrewingStation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedCell {
    pub offset: Offset,
    pub formed: bool,
    pub facing: String,
    pub pos_in_structure: u8,
}

impl Default for PersistedCell {
    fn default() -> Self {
        Self {
            offset: Offset::ZERO,
            formed: false,
            facing: Facing::default().name().to_string(),
            pos_in_structure: 0,
        }
    }
}

/// One non-air position. `block` names a [`BlockKind`] or, for structure
/// cells, a [`StructureKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedBlock {
    pub pos: CellPos,
    pub block: String,
    pub cell: Option<PersistedCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedStation {
    pub master: CellPos,
    pub station: PersistedStation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedWorld {
    pub min_y: i32,
    pub max_y: i32,
    pub blocks: Vec<SavedBlock>,
    pub stations: Vec<SavedStation>,
}

impl Default for SavedWorld {
    fn default() -> Self {
        Self {
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
            blocks: Vec::new(),
            stations: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

fn save_block(pos: CellPos, block: &Block) -> Option<SavedBlock> {
    match block {
        Block::Air => None,
        Block::Plain(kind) => Some(SavedBlock {
            pos,
            block: kind.name().to_string(),
            cell: None,
        }),
        Block::Part(part) => Some(SavedBlock {
            pos,
            block: part.structure.name().to_string(),
            cell: Some(PersistedCell {
                offset: part.cell.offset,
                formed: part.cell.formed,
                facing: part.cell.facing.name().to_string(),
                pos_in_structure: part.cell.pos_in_structure,
            }),
        }),
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

fn restore_cell(pos: CellPos, saved: Option<PersistedCell>) -> StructureCell {
    let Some(saved) = saved else {
        tracing::warn!(%pos, "structure block without cell data, leaving unformed");
        return StructureCell::default();
    };
    let facing = Facing::from_name(&saved.facing).unwrap_or_else(|| {
        tracing::warn!(%pos, facing = %saved.facing, "unknown facing, using default");
        Facing::default()
    });
    let entry = shape::CAULDRON.get(usize::from(saved.pos_in_structure));
    let consistent = entry.is_some_and(|e| e.part && e.offset == saved.offset);
    if !consistent {
        if saved.formed {
            tracing::warn!(
                %pos,
                index = saved.pos_in_structure,
                "cell offset disagrees with shape table, leaving unformed"
            );
        }
        return StructureCell {
            facing,
            ..StructureCell::default()
        };
    }
    StructureCell {
        offset: saved.offset,
        formed: saved.formed,
        facing,
        pos_in_structure: saved.pos_in_structure,
        suppress_drops: false,
    }
}

fn restore_block(saved: SavedBlock) -> Block {
    if let Some(structure) = StructureKind::from_name(&saved.block) {
        return Block::Part(PartBlock {
            structure,
            cell: restore_cell(saved.pos, saved.cell),
            station: None,
        });
    }
    match BlockKind::from_name(&saved.block) {
        Some(kind) => Block::Plain(kind),
        None => {
            tracing::warn!(pos = %saved.pos, block = %saved.block, "unknown block, using air");
            Block::Air
        }
    }
}

impl World {
    pub fn save(&self, registry: &Registry) -> SavedWorld {
        let blocks = self
            .blocks
            .iter()
            .filter_map(|(&pos, block)| save_block(pos, block))
            .collect();
        let stations = self
            .stations
            .iter()
            .filter_map(|(id, station)| {
                let master = *self.masters.get(id)?;
                Some(SavedStation {
                    master,
                    station: PersistedStation::capture(station, registry),
                })
            })
            .collect();
        SavedWorld {
            min_y: self.min_y,
            max_y: self.max_y,
            blocks,
            stations,
        }
    }

    /// Rebuild a world. Every formed master ends up with a station: its saved
    /// one if present, otherwise a fresh default.
    pub fn restore(saved: SavedWorld, registry: &Registry) -> World {
        let mut world = World::new(saved.min_y, saved.max_y);
        for block in saved.blocks {
            let pos = block.pos;
            world.put(pos, restore_block(block));
        }

        let mut payloads: BTreeMap<CellPos, PersistedStation> = BTreeMap::new();
        for s in saved.stations {
            if !world.is_master(s.master) {
                tracing::warn!(pos = %s.master, "saved station has no master cell, dropping");
                continue;
            }
            if payloads.insert(s.master, s.station).is_some() {
                tracing::warn!(pos = %s.master, "duplicate saved station, keeping the last");
            }
        }

        let masters: Vec<CellPos> = world
            .blocks
            .iter()
            .filter(|(_, b)| b.as_part().is_some_and(|p| p.cell.is_master()))
            .map(|(&pos, _)| pos)
            .collect();
        let config = registry.station_config();
        for pos in masters {
            let station = match payloads.remove(&pos) {
                Some(p) => p.restore(registry),
                None => {
                    tracing::warn!(%pos, "formed master without saved station, using default");
                    BrewingStation::new(config)
                }
            };
            let id = world.stations.insert(station);
            world.events.insert(id, EventBuffer::new(config.event_capacity));
            world.masters.insert(id, pos);
            if let Some(Block::Part(part)) = world.blocks.get_mut(&pos) {
                part.station = Some(id);
            }
        }
        world
    }
}
