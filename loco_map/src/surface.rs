// Surface slope geometry.
//
// A surface's slope is a 4-bit corner mask (bit 0 north, 1 east, 2 south,
// 3 west: a set bit means that corner is raised one land step) plus a
// double-height bit used only by "one corner down" shapes, where the corner
// opposite the lowered one rises a second step. All four bits set is never
// produced by terraforming and is treated as flat.
//
// Continuous heights inside a tile come from four families of piecewise
// linear functions over the sub-tile offset (xl, yl) in 0..=31: one corner
// up, one side up, one corner down (single and double height), and valleys.
// The integer arithmetic (truncating division, the off-by-one constants) is
// kept exactly so heights agree with the rendered terrain.
//
// See also: `element.rs` for the slope bit constants and `SurfaceElement`,
// `clearance.rs` which tests footprints against `surface_corner_heights`,
// `survey.rs` for the area queries built on `get_height`.

use crate::element::{SurfaceElement, slope};
use crate::store::WorldStore;
use crate::types::{SMALL_Z_STEP, SmallZ, TILE_SIZE, WorldPos};
use serde::{Deserialize, Serialize};

/// Largest sub-tile offset.
const SUB_TILE_MAX: i32 = TILE_SIZE - 1;

/// A tile corner, in slope-bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    North,
    East,
    South,
    West,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::North, Corner::East, Corner::South, Corner::West];

    /// The slope / quarter-tile bit for this corner.
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    pub const fn opposite(self) -> Corner {
        match self {
            Corner::North => Corner::South,
            Corner::East => Corner::West,
            Corner::South => Corner::North,
            Corner::West => Corner::East,
        }
    }
}

/// Land and water height at a world position, in world height units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileHeight {
    pub land: i32,
    pub water: i32,
}

impl TileHeight {
    /// Reported for positions off the map or tiles without a surface.
    pub const OFF_MAP: TileHeight = TileHeight { land: 16, water: 0 };
}

fn one_corner_up(corners: u8, xl: i32, yl: i32) -> i32 {
    let quad = match corners {
        slope::CORNER_UP_NORTH => xl + yl - SUB_TILE_MAX,
        slope::CORNER_UP_EAST => xl - yl,
        slope::CORNER_UP_SOUTH => SUB_TILE_MAX - yl - xl,
        slope::CORNER_UP_WEST => yl - xl,
        _ => 0,
    };
    if quad > 0 { quad / 2 } else { 0 }
}

fn one_side_up(corners: u8, xl: i32, yl: i32) -> i32 {
    match corners {
        slope::SIDE_UP_NORTHEAST => xl / 2 + 1,
        slope::SIDE_UP_SOUTHEAST => (SUB_TILE_MAX - yl) / 2,
        slope::SIDE_UP_NORTHWEST => yl / 2 + 1,
        slope::SIDE_UP_SOUTHWEST => (SUB_TILE_MAX - xl) / 2,
        _ => 0,
    }
}

// Covers both the single-height shape (three corners up) and the
// double-height shape (opposite corner two steps up).
fn one_corner_down(corners: u8, xl: i32, yl: i32, double_height: bool) -> i32 {
    let (quad_extra, quad) = match corners {
        slope::CORNER_DOWN_WEST => (xl + SUB_TILE_MAX - yl, xl - yl),
        slope::CORNER_DOWN_SOUTH => (xl + yl, xl + yl - SUB_TILE_MAX - 1),
        slope::CORNER_DOWN_EAST => (SUB_TILE_MAX - xl + yl, yl - xl),
        slope::CORNER_DOWN_NORTH => (
            (SUB_TILE_MAX - xl) + (SUB_TILE_MAX - yl),
            SUB_TILE_MAX - yl - xl - 1,
        ),
        _ => (0, 0),
    };
    if double_height {
        quad_extra / 2 + 1
    } else {
        quad / 2 + 16
    }
}

fn valley(corners: u8, xl: i32, yl: i32) -> i32 {
    let quad = match corners {
        slope::VALLEY_WESTEAST if xl + yl > SUB_TILE_MAX + 1 => SUB_TILE_MAX - xl - yl,
        slope::VALLEY_NORTHSOUTH => xl - yl,
        _ => 0,
    };
    if quad > 0 { quad / 2 } else { 0 }
}

/// Height above the surface base at sub-tile offset (`xl`, `yl`), in world
/// height units, for a 5-bit slope value.
pub fn land_height_offset(slope_bits: u8, xl: i32, yl: i32) -> i32 {
    let corners = slope_bits & slope::ALL_CORNERS;
    let double_height = slope_bits & slope::DOUBLE_HEIGHT != 0;
    match corners {
        slope::CORNER_UP_NORTH
        | slope::CORNER_UP_EAST
        | slope::CORNER_UP_SOUTH
        | slope::CORNER_UP_WEST => one_corner_up(corners, xl, yl),
        slope::SIDE_UP_NORTHEAST
        | slope::SIDE_UP_SOUTHEAST
        | slope::SIDE_UP_NORTHWEST
        | slope::SIDE_UP_SOUTHWEST => one_side_up(corners, xl, yl),
        slope::CORNER_DOWN_NORTH
        | slope::CORNER_DOWN_EAST
        | slope::CORNER_DOWN_SOUTH
        | slope::CORNER_DOWN_WEST => one_corner_down(corners, xl, yl, double_height),
        slope::VALLEY_NORTHSOUTH | slope::VALLEY_WESTEAST => valley(corners, xl, yl),
        _ => 0,
    }
}

/// Land and water height at a world position.
pub fn get_height(store: &WorldStore, pos: WorldPos) -> TileHeight {
    let width = store.columns() * TILE_SIZE;
    let height = store.rows() * TILE_SIZE;
    if pos.x < 0 || pos.y < 0 || pos.x >= width - 1 || pos.y >= height - 1 {
        return TileHeight::OFF_MAP;
    }
    let tile = store.get(pos.tile());
    let Some(surface) = tile.surface() else {
        return TileHeight::OFF_MAP;
    };
    let (xl, yl) = pos.sub_tile();
    TileHeight {
        land: surface.base_height() + land_height_offset(surface.slope(), xl, yl),
        water: surface.water_height(),
    }
}

/// Clearance top of a surface with the given base and slope: one land step
/// above the base when any corner is raised, two for double height.
pub fn surface_clear_z(base_z: SmallZ, slope_bits: u8) -> SmallZ {
    let mut clear_z = base_z;
    if slope_bits & slope::ALL_CORNERS != 0 {
        clear_z = clear_z.saturating_add(SMALL_Z_STEP);
    }
    if slope_bits & slope::DOUBLE_HEIGHT != 0 {
        clear_z = clear_z.saturating_add(SMALL_Z_STEP);
    }
    clear_z
}

/// Height of the highest point of the surface.
pub fn surface_corner_height(surface: &SurfaceElement) -> SmallZ {
    surface_clear_z(surface.base_z(), surface.slope())
}

/// Height of one corner, including the second step of a double-height slope.
pub fn surface_corner_height_at(surface: &SurfaceElement, corner: Corner) -> SmallZ {
    let mut z = surface_corner_down_height(surface, corner);
    let double_peak = ((slope::ALL_CORNERS & !corner.opposite().bit()) | slope::DOUBLE_HEIGHT)
        == surface.slope();
    if double_peak {
        z = z.saturating_add(SMALL_Z_STEP);
    }
    z
}

/// Height of one corner from the corner mask alone, ignoring double height.
pub fn surface_corner_down_height(surface: &SurfaceElement, corner: Corner) -> SmallZ {
    if surface.slope_corners() & corner.bit() != 0 {
        surface.base_z().saturating_add(SMALL_Z_STEP)
    } else {
        surface.base_z()
    }
}

/// All four corner heights in north, east, south, west order.
pub fn surface_corner_heights(surface: &SurfaceElement) -> [SmallZ; 4] {
    Corner::ALL.map(|corner| surface_corner_height_at(surface, corner))
}
