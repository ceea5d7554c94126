//! Per-cell identity: positions, offsets, and the blocks that occupy them.

use herbalist_core::id::StationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A position in the 3D grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn up(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    pub fn down(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Relative displacement from a structure's master cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        dx: 0,
        dy: 0,
        dz: 0,
    };

    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    pub fn is_zero(self) -> bool {
        self == Offset::ZERO
    }
}

impl Add<Offset> for CellPos {
    type Output = CellPos;

    fn add(self, o: Offset) -> CellPos {
        CellPos::new(self.x + o.dx, self.y + o.dy, self.z + o.dz)
    }
}

impl Sub<Offset> for CellPos {
    type Output = CellPos;

    fn sub(self, o: Offset) -> CellPos {
        CellPos::new(self.x - o.dx, self.y - o.dy, self.z - o.dz)
    }
}

impl Sub<CellPos> for CellPos {
    type Output = Offset;

    fn sub(self, other: CellPos) -> Offset {
        Offset::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Horizontal facing chosen when a structure forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    North,
    East,
    South,
    West,
}

impl Facing {
    pub fn all() -> [Facing; 4] {
        [Facing::North, Facing::East, Facing::South, Facing::West]
    }

    pub fn name(self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
        }
    }

    pub fn from_name(name: &str) -> Option<Facing> {
        Facing::all()
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Plain (non-structure) block content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Bricks,
    BrickSlabTop,
    Stone,
    Fire,
    SoulFire,
    Lava,
    Magma,
    Campfire { lit: bool },
}

impl BlockKind {
    const NAMED: [BlockKind; 9] = [
        BlockKind::Bricks,
        BlockKind::BrickSlabTop,
        BlockKind::Stone,
        BlockKind::Fire,
        BlockKind::SoulFire,
        BlockKind::Lava,
        BlockKind::Magma,
        BlockKind::Campfire { lit: false },
        BlockKind::Campfire { lit: true },
    ];

    /// Whether this block heats a station standing over it.
    pub fn is_heat_source(self) -> bool {
        match self {
            BlockKind::Fire | BlockKind::SoulFire | BlockKind::Lava | BlockKind::Magma => true,
            BlockKind::Campfire { lit } => lit,
            BlockKind::Bricks | BlockKind::BrickSlabTop | BlockKind::Stone => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Bricks => "bricks",
            BlockKind::BrickSlabTop => "brick_slab_top",
            BlockKind::Stone => "stone",
            BlockKind::Fire => "fire",
            BlockKind::SoulFire => "soul_fire",
            BlockKind::Lava => "lava",
            BlockKind::Magma => "magma",
            BlockKind::Campfire { lit: false } => "campfire",
            BlockKind::Campfire { lit: true } => "lit_campfire",
        }
    }

    pub fn from_name(name: &str) -> Option<BlockKind> {
        BlockKind::NAMED
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

/// Which multiblock a part belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StructureKind {
    #[default]
    Cauldron,
}

impl StructureKind {
    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Cauldron => "cauldron",
        }
    }

    pub fn from_name(name: &str) -> Option<StructureKind> {
        name.eq_ignore_ascii_case("cauldron")
            .then_some(StructureKind::Cauldron)
    }
}

/// One grid position's participation in a structure.
///
/// `offset` points from the master to this cell, so the master sits at
/// `position - offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureCell {
    pub offset: Offset,
    pub formed: bool,
    pub facing: Facing,
    /// Index into the structure's shape table.
    pub pos_in_structure: u8,
    /// Set during teardown on cells whose restoration must not drop items.
    pub suppress_drops: bool,
}

impl StructureCell {
    pub fn is_master(&self) -> bool {
        self.formed && self.offset.is_zero()
    }
}

/// A grid cell that belongs to a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartBlock {
    pub structure: StructureKind,
    pub cell: StructureCell,
    /// Station payload, present on the master only.
    pub station: Option<StationId>,
}

/// Content of one grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    #[default]
    Air,
    Plain(BlockKind),
    Part(PartBlock),
}

impl Block {
    pub fn is_air(&self) -> bool {
        matches!(self, Block::Air)
    }

    pub fn as_part(&self) -> Option<&PartBlock> {
        match self {
            Block::Part(part) => Some(part),
            _ => None,
        }
    }

    pub fn plain_kind(&self) -> Option<BlockKind> {
        match self {
            Block::Plain(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_invert_positions() {
        let master = CellPos::new(10, 64, -3);
        let cell = CellPos::new(11, 65, -4);
        let offset = cell - master;
        assert_eq!(offset, Offset::new(1, 1, -1));
        assert_eq!(cell - offset, master);
        assert_eq!(master + offset, cell);
    }

    #[test]
    fn only_formed_zero_offset_is_master() {
        let mut cell = StructureCell::default();
        assert!(!cell.is_master());
        cell.formed = true;
        assert!(cell.is_master());
        cell.offset = Offset::new(0, 1, 0);
        assert!(!cell.is_master());
    }

    #[test]
    fn heat_sources() {
        assert!(BlockKind::Fire.is_heat_source());
        assert!(BlockKind::SoulFire.is_heat_source());
        assert!(BlockKind::Lava.is_heat_source());
        assert!(BlockKind::Magma.is_heat_source());
        assert!(BlockKind::Campfire { lit: true }.is_heat_source());
        assert!(!BlockKind::Campfire { lit: false }.is_heat_source());
        assert!(!BlockKind::Stone.is_heat_source());
    }

    #[test]
    fn block_names_round_trip() {
        for kind in BlockKind::NAMED {
            assert_eq!(BlockKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(BlockKind::from_name("obsidian"), None);
        for facing in Facing::all() {
            assert_eq!(Facing::from_name(facing.name()), Some(facing));
        }
        assert_eq!(
            StructureKind::from_name("Cauldron"),
            Some(StructureKind::Cauldron)
        );
    }

    #[test]
    fn display_pos() {
        assert_eq!(CellPos::new(1, -2, 3).to_string(), "(1, -2, 3)");
    }
}
