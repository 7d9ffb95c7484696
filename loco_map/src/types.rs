// Core types shared across the map store.
//
// Defines the two coordinate spaces (`TilePos` in whole tiles, `WorldPos` in
// world units where one tile is `TILE_SIZE` units wide), the 3D `Pos3` used
// to key building origins, the height unit constants, and small id newtypes
// for objects the elements refer to. All types derive `Serialize` and
// `Deserialize` so saved worlds and configs can carry them.
//
// Height units: element `base_z`/`clear_z` are "small z" values. One small z
// unit is `SMALL_Z_STEP` world height units, and one full land step (a raised
// corner) is also `SMALL_Z_STEP` small z units. Water is stored in "micro z"
// (`MICRO_TO_SMALL_Z_STEP` small z units each).
//
// See also: `element.rs` for the 8-byte record that stores these heights,
// `store.rs` for the coordinate index keyed by `TilePos`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// World units per tile edge. Sub-tile coordinates run `0..TILE_SIZE`.
pub const TILE_SIZE: i32 = 32;

/// Small z units per land height step, and world height units per small z.
pub const SMALL_Z_STEP: u8 = 4;

/// Small z units per micro z (water level) unit.
pub const MICRO_TO_SMALL_Z_STEP: u8 = 4;

/// World height units per micro z unit.
pub const MICRO_Z_STEP: i16 = 16;

/// Coarse element height in small z units.
pub type SmallZ = u8;

/// Water level in micro z units (5 bits on the surface record).
pub type MicroZ = u8;

/// Money amount, matching the 32-bit currency used by cost accounting.
pub type Currency = i32;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A tile coordinate (whole tiles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of the tile's north corner.
    pub const fn to_world(self) -> WorldPos {
        WorldPos::new(self.x * TILE_SIZE, self.y * TILE_SIZE)
    }
}

impl Add for TilePos {
    type Output = TilePos;
    fn add(self, rhs: TilePos) -> TilePos {
        TilePos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for TilePos {
    type Output = TilePos;
    fn sub(self, rhs: TilePos) -> TilePos {
        TilePos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// A position in world units. `x / TILE_SIZE` selects the tile, `x % TILE_SIZE`
/// the sub-tile offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
}

impl WorldPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing this position.
    pub const fn tile(self) -> TilePos {
        TilePos::new(self.x.div_euclid(TILE_SIZE), self.y.div_euclid(TILE_SIZE))
    }

    /// Sub-tile offset in `0..TILE_SIZE` on each axis.
    pub const fn sub_tile(self) -> (i32, i32) {
        (self.x & (TILE_SIZE - 1), self.y & (TILE_SIZE - 1))
    }
}

impl From<TilePos> for WorldPos {
    fn from(pos: TilePos) -> Self {
        pos.to_world()
    }
}

impl Add for WorldPos {
    type Output = WorldPos;
    fn add(self, rhs: WorldPos) -> WorldPos {
        WorldPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for WorldPos {
    type Output = WorldPos;
    fn sub(self, rhs: WorldPos) -> WorldPos {
        WorldPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A world position plus a height in world units. Ordered so it can key
/// sorted sets (building origins are deduplicated by it).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Pos3 {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn from_world(pos: WorldPos, z: i32) -> Self {
        Self::new(pos.x, pos.y, z)
    }

    pub const fn world(self) -> WorldPos {
        WorldPos::new(self.x, self.y)
    }
}

/// World offsets of the four pieces of a 2×2 multi-tile object, indexed by
/// the piece's sequence index. Subtracting the offset of a piece from its
/// position yields the object's origin tile.
pub const MULTI_TILE_OFFSETS: [WorldPos; 4] = [
    WorldPos::new(0, 0),
    WorldPos::new(0, TILE_SIZE),
    WorldPos::new(TILE_SIZE, TILE_SIZE),
    WorldPos::new(TILE_SIZE, 0),
];

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Owning company. Stored as a 4-bit field on owned elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub u8);

impl CompanyId {
    /// The "no company" owner used for unowned or town property.
    pub const NEUTRAL: CompanyId = CompanyId(15);
    /// Sentinel for "this element has no owner field".
    pub const NULL: CompanyId = CompanyId(u8::MAX);
}

/// Index of an industry instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndustryId(pub u8);

/// Index of a station instance (10 bits on the station record).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(pub u16);
