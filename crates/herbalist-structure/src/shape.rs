//! The cauldron footprint: one table drives both validation and restoration.
//!
//! The footprint is 3x3x2 with the master at the center of the bottom layer.
//! Entries are indexed `dy * 9 + (dz + 1) * 3 + (dx + 1)`; that index is
//! what a cell persists as `pos_in_structure`.

use crate::cell::{BlockKind, Offset};

/// One footprint position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeEntry {
    pub offset: Offset,
    /// Content expected before formation and restored after teardown.
    /// `None` means air.
    pub original: Option<BlockKind>,
    /// Whether this position becomes a structure cell.
    pub part: bool,
}

pub const SHAPE_LEN: usize = 18;

const fn bottom(dx: i32, dz: i32) -> ShapeEntry {
    let corner = dx != 0 && dz != 0;
    ShapeEntry {
        offset: Offset::new(dx, 0, dz),
        original: Some(if corner {
            BlockKind::Bricks
        } else {
            BlockKind::BrickSlabTop
        }),
        part: true,
    }
}

const fn top(dx: i32, dz: i32) -> ShapeEntry {
    let center = dx == 0 && dz == 0;
    ShapeEntry {
        offset: Offset::new(dx, 1, dz),
        original: if center { None } else { Some(BlockKind::Bricks) },
        part: !center,
    }
}

/// The full cauldron table.
pub const CAULDRON: [ShapeEntry; SHAPE_LEN] = [
    bottom(-1, -1),
    bottom(0, -1),
    bottom(1, -1),
    bottom(-1, 0),
    bottom(0, 0),
    bottom(1, 0),
    bottom(-1, 1),
    bottom(0, 1),
    bottom(1, 1),
    top(-1, -1),
    top(0, -1),
    top(1, -1),
    top(-1, 0),
    top(0, 0),
    top(1, 0),
    top(-1, 1),
    top(0, 1),
    top(1, 1),
];

/// Table index of an offset, if it lies inside the footprint.
pub fn index_of(offset: Offset) -> Option<usize> {
    let in_range = |v: i32| (-1..=1).contains(&v);
    if !in_range(offset.dx) || !in_range(offset.dz) || !(0..=1).contains(&offset.dy) {
        return None;
    }
    Some((offset.dy * 9 + (offset.dz + 1) * 3 + (offset.dx + 1)) as usize)
}

pub fn entry_for(offset: Offset) -> Option<&'static ShapeEntry> {
    index_of(offset).map(|i| &CAULDRON[i])
}

/// Footprint positions that become structure cells.
pub fn parts() -> impl Iterator<Item = (usize, &'static ShapeEntry)> {
    CAULDRON.iter().enumerate().filter(|(_, e)| e.part)
}

/// Offsets a player may trigger formation from: the top-layer ring.
pub fn trigger_offsets() -> impl Iterator<Item = Offset> {
    CAULDRON
        .iter()
        .filter(|e| e.part && e.offset.dy == 1)
        .map(|e| e.offset)
}
