//! Structure formation and disassembly.

use crate::cell::{Block, BlockKind, CellPos, Facing, PartBlock, StructureCell, StructureKind};
use crate::shape::{self, ShapeEntry};
use crate::world::World;
use herbalist_core::event::EventBuffer;
use herbalist_core::item::ResourceStack;
use herbalist_core::registry::Registry;
use herbalist_core::station::BrewingStation;

/// Why a footprint could not form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormationError {
    #[error("no master cell can be located from the trigger")]
    NoMaster,
    #[error("footprint cell {pos} is outside the world")]
    OutOfBounds { pos: CellPos },
    #[error("footprint cell {pos} does not hold the expected block")]
    Mismatch { pos: CellPos },
    #[error("footprint cell {pos} already belongs to a structure")]
    Occupied { pos: CellPos },
}

/// What a teardown produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub master: CellPos,
    /// Station contents, ejected once from the master.
    pub ejected: Vec<ResourceStack>,
    /// Cells that got their pre-structure block back.
    pub restored: Vec<CellPos>,
    /// The cell whose removal triggered the teardown.
    pub destroyed: Option<CellPos>,
    /// The block the destroyed cell drops.
    pub dropped: Option<BlockKind>,
}

fn expected(entry: &ShapeEntry) -> Block {
    entry.original.map_or(Block::Air, Block::Plain)
}

impl World {
    // -- Formation --

    /// Form a cauldron from one of its top-ring bricks.
    ///
    /// Every center the trigger could belong to is probed; the first that
    /// validates wins. Nothing is written unless the whole footprint passes.
    pub fn form_cauldron(
        &mut self,
        trigger: CellPos,
        facing: Facing,
        registry: &Registry,
    ) -> Result<CellPos, FormationError> {
        match self.block(trigger) {
            Block::Part(_) => return Err(FormationError::Occupied { pos: trigger }),
            Block::Plain(BlockKind::Bricks) => {}
            _ => return Err(FormationError::NoMaster),
        }

        let mut first_err = None;
        for candidate in shape::trigger_offsets().map(|o| trigger - o) {
            if !self.plausible_master(candidate) {
                continue;
            }
            match self.validate_footprint(candidate) {
                Ok(()) => {
                    self.commit(candidate, facing, registry);
                    return Ok(candidate);
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(FormationError::NoMaster))
    }

    fn plausible_master(&self, pos: CellPos) -> bool {
        self.block(pos) == Block::Plain(BlockKind::BrickSlabTop) && self.block(pos.up()).is_air()
    }

    fn validate_footprint(&self, master: CellPos) -> Result<(), FormationError> {
        for entry in &shape::CAULDRON {
            let pos = master + entry.offset;
            if !self.in_bounds(pos) {
                return Err(FormationError::OutOfBounds { pos });
            }
        }
        for entry in &shape::CAULDRON {
            let pos = master + entry.offset;
            let found = self.block(pos);
            if matches!(found, Block::Part(_)) {
                return Err(FormationError::Occupied { pos });
            }
            if found != expected(entry) {
                return Err(FormationError::Mismatch { pos });
            }
        }
        Ok(())
    }

    fn commit(&mut self, master: CellPos, facing: Facing, registry: &Registry) {
        let config = registry.station_config();
        let id = self.stations.insert(BrewingStation::new(config));
        self.events.insert(id, EventBuffer::new(config.event_capacity));
        self.masters.insert(id, master);

        for (index, entry) in shape::parts() {
            let cell = StructureCell {
                offset: entry.offset,
                formed: true,
                facing,
                pos_in_structure: index as u8,
                suppress_drops: false,
            };
            let part = PartBlock {
                structure: StructureKind::Cauldron,
                cell,
                station: entry.offset.is_zero().then_some(id),
            };
            self.put(master + entry.offset, Block::Part(part));
        }
        tracing::info!(
            x = master.x,
            y = master.y,
            z = master.z,
            facing = facing.name(),
            "cauldron formed"
        );
    }

    // -- Disassembly --

    /// A cell was destroyed. If it belonged to a formed structure the whole
    /// structure comes apart and the destroyed cell becomes air.
    ///
    /// Destroying a cell that resolves to no master just clears it.
    pub fn break_cell(&mut self, pos: CellPos) -> Option<Disassembly> {
        match self.resolve_master(pos) {
            Some(handle) => Some(self.teardown(handle.pos, Some(pos))),
            None => {
                self.blocks.remove(&pos);
                None
            }
        }
    }

    /// Controlled teardown: every cell, including the one at `pos`, gets its
    /// original block back.
    pub fn dismantle(&mut self, pos: CellPos) -> Option<Disassembly> {
        let handle = self.resolve_master(pos)?;
        Some(self.teardown(handle.pos, None))
    }

    fn teardown(&mut self, master: CellPos, destroyed: Option<CellPos>) -> Disassembly {
        let mut ejected = Vec::new();
        if let Some(id) = self.part_at(master).and_then(|p| p.station) {
            self.events.remove(id);
            self.masters.remove(id);
            if let Some(station) = self.stations.remove(id) {
                ejected = station.into_contents();
            }
        }

        // Pass 1: unform every cell of this structure.
        let mut cells = Vec::new();
        for (_, entry) in shape::parts() {
            let pos = master + entry.offset;
            let Some(Block::Part(part)) = self.blocks.get_mut(&pos) else {
                continue;
            };
            if !part.cell.formed || part.cell.offset != entry.offset {
                continue;
            }
            part.cell.formed = false;
            part.cell.suppress_drops = Some(pos) != destroyed;
            part.station = None;
            cells.push(pos);
        }

        // Pass 2: put the pre-structure content back. Only the cell left
        // without `suppress_drops` drops its own block.
        let mut restored = Vec::new();
        let mut dropped = None;
        for pos in cells {
            let Some(part) = self.part_at(pos) else {
                continue;
            };
            let original = shape::entry_for(part.cell.offset).map_or(Block::Air, expected);
            if part.cell.suppress_drops {
                self.put(pos, original);
                restored.push(pos);
            } else {
                dropped = original.plain_kind();
                self.put(pos, Block::Air);
            }
        }

        tracing::info!(
            x = master.x,
            y = master.y,
            z = master.z,
            ejected = ejected.len(),
            restored = restored.len(),
            "cauldron disassembled"
        );
        Disassembly {
            master,
            ejected,
            restored,
            destroyed,
            dropped,
        }
    }
}
