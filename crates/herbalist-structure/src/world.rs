//! The grid and the station payloads owned by its master cells.
//!
//! Cells never hold back-references: a structure cell stores only its offset
//! from the master, and every query resolves the master by position.

use crate::cell::{Block, CellPos, PartBlock};
use crate::heat::GridHeat;
use herbalist_core::event::{EventBuffer, StationEvent};
use herbalist_core::id::StationId;
use herbalist_core::machine::PhaseStateMachine;
use herbalist_core::property::NEUTRAL_COLOR;
use herbalist_core::registry::Registry;
use herbalist_core::station::{BrewingStation, Phase, StationView};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::BTreeMap;

pub const DEFAULT_MIN_Y: i32 = -64;
pub const DEFAULT_MAX_Y: i32 = 319;

/// A resolved master cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterHandle {
    pub pos: CellPos,
    pub station: StationId,
}

/// Sparse block grid plus the station arena.
#[derive(Debug)]
pub struct World {
    pub(crate) blocks: BTreeMap<CellPos, Block>,
    pub(crate) min_y: i32,
    pub(crate) max_y: i32,
    pub(crate) stations: SlotMap<StationId, BrewingStation>,
    pub(crate) events: SecondaryMap<StationId, EventBuffer>,
    pub(crate) masters: SecondaryMap<StationId, CellPos>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_Y, DEFAULT_MAX_Y)
    }
}

impl World {
    /// A world whose buildable layers are `min_y..=max_y`.
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            blocks: BTreeMap::new(),
            min_y: min_y.min(max_y),
            max_y: max_y.max(min_y),
            stations: SlotMap::with_key(),
            events: SecondaryMap::new(),
            masters: SecondaryMap::new(),
        }
    }

    // -- Grid --

    pub fn in_bounds(&self, pos: CellPos) -> bool {
        (self.min_y..=self.max_y).contains(&pos.y)
    }

    /// Content at `pos`; unset positions are air.
    pub fn block(&self, pos: CellPos) -> Block {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }

    /// Overwrite a plain cell. Structure cells are managed by formation and
    /// teardown, so writing over one is refused.
    pub fn set_block(&mut self, pos: CellPos, block: Block) -> bool {
        if !self.in_bounds(pos) || matches!(block, Block::Part(_)) {
            return false;
        }
        if matches!(self.blocks.get(&pos), Some(Block::Part(_))) {
            return false;
        }
        self.put(pos, block);
        true
    }

    pub(crate) fn put(&mut self, pos: CellPos, block: Block) {
        if block.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block);
        }
    }

    pub(crate) fn part_at(&self, pos: CellPos) -> Option<PartBlock> {
        self.blocks.get(&pos).and_then(Block::as_part).copied()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    // -- Addressing --

    /// Follow a cell's offset to its master.
    ///
    /// `None` when the cell is unformed or when the position it points at is
    /// not a live master of the same structure kind.
    pub fn resolve_master(&self, pos: CellPos) -> Option<MasterHandle> {
        let part = self.part_at(pos)?;
        if !part.cell.formed {
            return None;
        }
        let master_pos = pos - part.cell.offset;
        let master = self.part_at(master_pos)?;
        if master.structure != part.structure || !master.cell.is_master() {
            return None;
        }
        let station = master.station?;
        self.stations.contains_key(station).then_some(MasterHandle {
            pos: master_pos,
            station,
        })
    }

    pub fn is_master(&self, pos: CellPos) -> bool {
        self.part_at(pos).is_some_and(|p| p.cell.is_master())
    }

    // -- Delegating reads --

    pub fn station_at(&self, pos: CellPos) -> Option<&BrewingStation> {
        let handle = self.resolve_master(pos)?;
        self.stations.get(handle.station)
    }

    pub fn phase_at(&self, pos: CellPos) -> Option<Phase> {
        self.station_at(pos).map(BrewingStation::phase)
    }

    /// Potion color seen from any cell; neutral when no station resolves.
    pub fn potion_color_at(&self, pos: CellPos) -> u32 {
        self.station_at(pos)
            .map_or(NEUTRAL_COLOR, |s| s.potion().color)
    }

    pub fn view_at(&self, pos: CellPos) -> Option<StationView> {
        self.station_at(pos).map(BrewingStation::view)
    }

    pub fn events_at(&self, pos: CellPos) -> Option<&EventBuffer> {
        let handle = self.resolve_master(pos)?;
        self.events.get(handle.station)
    }

    pub fn drain_events(&mut self, pos: CellPos) -> Vec<StationEvent> {
        let Some(handle) = self.resolve_master(pos) else {
            return Vec::new();
        };
        self.events
            .get_mut(handle.station)
            .map(EventBuffer::drain)
            .unwrap_or_default()
    }

    // -- Mutation --

    /// Run `f` against the state machine of the station `pos` belongs to.
    ///
    /// Returns `None` if no master resolves from `pos`.
    pub fn with_machine<R, F>(&mut self, pos: CellPos, registry: &Registry, f: F) -> Option<R>
    where
        F: FnOnce(&mut PhaseStateMachine<'_, GridHeat<'_>>) -> R,
    {
        let handle = self.resolve_master(pos)?;
        let heat = GridHeat::new(&self.blocks, handle.pos);
        let station = self.stations.get_mut(handle.station)?;
        let events = self.events.get_mut(handle.station)?;
        let mut machine = PhaseStateMachine::new(station, registry, heat, events);
        Some(f(&mut machine))
    }

    /// Advance every station by one tick.
    pub fn tick(&mut self, registry: &Registry) {
        for (id, station) in self.stations.iter_mut() {
            let (Some(&master), Some(events)) = (self.masters.get(id), self.events.get_mut(id))
            else {
                continue;
            };
            let heat = GridHeat::new(&self.blocks, master);
            PhaseStateMachine::new(station, registry, heat, events).tick();
        }
    }
}
