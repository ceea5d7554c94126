//! Heat oracle backed by the grid under a master cell.

use crate::cell::{Block, CellPos};
use herbalist_core::machine::HeatSource;
use std::collections::BTreeMap;

/// Scans the 3x3 area one layer below the master for a heat source.
#[derive(Debug, Clone, Copy)]
pub struct GridHeat<'a> {
    blocks: &'a BTreeMap<CellPos, Block>,
    master: CellPos,
}

impl<'a> GridHeat<'a> {
    pub fn new(blocks: &'a BTreeMap<CellPos, Block>, master: CellPos) -> Self {
        Self { blocks, master }
    }

    fn below(&self) -> impl Iterator<Item = CellPos> + '_ {
        let base = self.master.down();
        (-1..=1).flat_map(move |dz| {
            (-1..=1).map(move |dx| CellPos::new(base.x + dx, base.y, base.z + dz))
        })
    }
}

impl HeatSource for GridHeat<'_> {
    fn has_heat(&self) -> bool {
        self.below().any(|pos| {
            self.blocks
                .get(&pos)
                .and_then(Block::plain_kind)
                .is_some_and(|kind| kind.is_heat_source())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::BlockKind;

    #[test]
    fn empty_grid_is_cold() {
        let blocks = BTreeMap::new();
        assert!(!GridHeat::new(&blocks, CellPos::new(0, 5, 0)).has_heat());
    }

    #[test]
    fn fire_in_corner_below_heats() {
        let mut blocks = BTreeMap::new();
        blocks.insert(CellPos::new(1, 4, -1), Block::Plain(BlockKind::Fire));
        assert!(GridHeat::new(&blocks, CellPos::new(0, 5, 0)).has_heat());
    }

    #[test]
    fn unlit_campfire_and_distant_fire_are_cold() {
        let mut blocks = BTreeMap::new();
        blocks.insert(
            CellPos::new(0, 4, 0),
            Block::Plain(BlockKind::Campfire { lit: false }),
        );
        blocks.insert(CellPos::new(2, 4, 0), Block::Plain(BlockKind::Lava));
        blocks.insert(CellPos::new(0, 3, 0), Block::Plain(BlockKind::Magma));
        assert!(!GridHeat::new(&blocks, CellPos::new(0, 5, 0)).has_heat());
    }
}
