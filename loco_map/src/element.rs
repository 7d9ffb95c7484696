// The 8-byte tile element record and its nine typed views.
//
// Every feature stacked on a tile (terrain surface, track, station, signal,
// building, tree, wall, road, industry) is one `TileElement`: a fixed 8-byte
// record with a 4-byte common header and a 4-byte kind-specific payload. The
// layout is the persisted layout, so it is `#[repr(C)]` and `Pod`.
//
// Header:
//   byte 0  type   bits 2..=5 kind index, bits 0..=1 rotation/direction,
//                  bits 6..=7 kind-specific
//   byte 1  flags  bits 0..=3 occupied quarters, bit 4 ghost,
//                  bit 5 ai-allocated, bit 6 kind-specific, bit 7 last-in-run
//   byte 2  base_z
//   byte 3  clear_z
//
// Narrowing is checked: `as_kind::<T>()` hands out a `&T` only when the
// record's kind matches `T::KIND`, and `view()` yields an exhaustive
// `ElementRef` for match dispatch. The typed views are `#[repr(transparent)]`
// wrappers, so narrowing never copies and mutators rewrite bits of the one
// record in the arena.
//
// See also: `store.rs` which owns the arena of these records and maintains
// the last-in-run flag, `quarter_tile.rs` for the occupied-quarter mask,
// `clearance.rs` for the collision tests that read the header.

use crate::types::{CompanyId, IndustryId, SMALL_Z_STEP, SmallZ, StationId};
use bytemuck::{Pod, TransparentWrapper, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// `base_z` value that marks an arena slot as free.
pub const FREE_SLOT_Z: SmallZ = 255;

/// Bits of the flags byte.
pub mod element_flags {
    pub const OCCUPIED_QUARTERS: u8 = 0x0F;
    pub const GHOST: u8 = 1 << 4;
    pub const AI_ALLOCATED: u8 = 1 << 5;
    /// On track and road pieces: this is the last piece of a multi-tile run.
    pub const FLAG_6: u8 = 1 << 6;
    pub const LAST: u8 = 1 << 7;
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The nine element kinds, in on-disk index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Surface,
    Track,
    Station,
    Signal,
    Building,
    Tree,
    Wall,
    Road,
    Industry,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Surface,
        ElementKind::Track,
        ElementKind::Station,
        ElementKind::Signal,
        ElementKind::Building,
        ElementKind::Tree,
        ElementKind::Wall,
        ElementKind::Road,
        ElementKind::Industry,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub const fn index(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct TileElement {
    type_byte: u8,
    flags: u8,
    base_z: u8,
    clear_z: u8,
    data: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<TileElement>() == 8);

impl TileElement {
    /// A zeroed record of the given kind.
    pub fn new(kind: ElementKind) -> Self {
        let mut el = Self::zeroed();
        el.set_kind(kind);
        el
    }

    /// Reinterpret raw persisted bytes. The kind is not validated here; see
    /// `kind_checked()`.
    pub fn from_bytes(raw: [u8; 8]) -> Self {
        bytemuck::cast(raw)
    }

    pub fn to_bytes(self) -> [u8; 8] {
        bytemuck::cast(self)
    }

    /// The kind, or `None` if the type byte holds an index past `Industry`.
    pub fn kind_checked(&self) -> Option<ElementKind> {
        ElementKind::from_index((self.type_byte >> 2) & 0x0F)
    }

    /// The kind of this record. Records entering the store are validated by
    /// `kind_checked()`, so live elements always decode; a corrupt byte reads
    /// as `Surface` rather than panicking.
    pub fn kind(&self) -> ElementKind {
        self.kind_checked().unwrap_or(ElementKind::Surface)
    }

    /// Set the kind. Clobbers the rest of the type byte, like a fresh record.
    pub fn set_kind(&mut self, kind: ElementKind) {
        self.type_byte = kind.index() << 2;
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn base_z(&self) -> SmallZ {
        self.base_z
    }

    pub fn set_base_z(&mut self, z: SmallZ) {
        self.base_z = z;
    }

    pub fn clear_z(&self) -> SmallZ {
        self.clear_z
    }

    pub fn set_clear_z(&mut self, z: SmallZ) {
        self.clear_z = z;
    }

    /// Base in world height units.
    pub fn base_height(&self) -> i32 {
        i32::from(self.base_z) * i32::from(SMALL_Z_STEP)
    }

    /// Clearance top in world height units.
    pub fn clear_height(&self) -> i32 {
        i32::from(self.clear_z) * i32::from(SMALL_Z_STEP)
    }

    pub fn is_free(&self) -> bool {
        self.base_z == FREE_SLOT_Z
    }

    pub fn occupied_quarter(&self) -> u8 {
        self.flags & element_flags::OCCUPIED_QUARTERS
    }

    pub fn set_occupied_quarter(&mut self, quarters: u8) {
        self.flags = (self.flags & !element_flags::OCCUPIED_QUARTERS)
            | (quarters & element_flags::OCCUPIED_QUARTERS);
    }

    pub fn is_ghost(&self) -> bool {
        self.flag(element_flags::GHOST)
    }

    pub fn set_ghost(&mut self, state: bool) {
        self.set_flag(element_flags::GHOST, state);
    }

    pub fn is_ai_allocated(&self) -> bool {
        self.flag(element_flags::AI_ALLOCATED)
    }

    pub fn set_ai_allocated(&mut self, state: bool) {
        self.set_flag(element_flags::AI_ALLOCATED, state);
    }

    pub fn is_flag_6(&self) -> bool {
        self.flag(element_flags::FLAG_6)
    }

    pub fn set_flag_6(&mut self, state: bool) {
        self.set_flag(element_flags::FLAG_6, state);
    }

    pub fn is_last(&self) -> bool {
        self.flag(element_flags::LAST)
    }

    pub fn set_last(&mut self, state: bool) {
        self.set_flag(element_flags::LAST, state);
    }

    /// Checked narrowing to a typed view.
    pub fn as_kind<T: ElementView>(&self) -> Option<&T> {
        (self.kind() == T::KIND).then(|| T::wrap_ref(self))
    }

    /// Checked mutable narrowing to a typed view.
    pub fn as_kind_mut<T: ElementView>(&mut self) -> Option<&mut T> {
        if self.kind() == T::KIND {
            Some(T::wrap_mut(self))
        } else {
            None
        }
    }

    /// Exhaustive typed view for match dispatch.
    pub fn view(&self) -> ElementRef<'_> {
        match self.kind() {
            ElementKind::Surface => ElementRef::Surface(SurfaceElement::wrap_ref(self)),
            ElementKind::Track => ElementRef::Track(TrackElement::wrap_ref(self)),
            ElementKind::Station => ElementRef::Station(StationElement::wrap_ref(self)),
            ElementKind::Signal => ElementRef::Signal(SignalElement::wrap_ref(self)),
            ElementKind::Building => ElementRef::Building(BuildingElement::wrap_ref(self)),
            ElementKind::Tree => ElementRef::Tree(TreeElement::wrap_ref(self)),
            ElementKind::Wall => ElementRef::Wall(WallElement::wrap_ref(self)),
            ElementKind::Road => ElementRef::Road(RoadElement::wrap_ref(self)),
            ElementKind::Industry => ElementRef::Industry(IndustryElement::wrap_ref(self)),
        }
    }

    pub fn view_mut(&mut self) -> ElementMut<'_> {
        match self.kind() {
            ElementKind::Surface => ElementMut::Surface(SurfaceElement::wrap_mut(self)),
            ElementKind::Track => ElementMut::Track(TrackElement::wrap_mut(self)),
            ElementKind::Station => ElementMut::Station(StationElement::wrap_mut(self)),
            ElementKind::Signal => ElementMut::Signal(SignalElement::wrap_mut(self)),
            ElementKind::Building => ElementMut::Building(BuildingElement::wrap_mut(self)),
            ElementKind::Tree => ElementMut::Tree(TreeElement::wrap_mut(self)),
            ElementKind::Wall => ElementMut::Wall(WallElement::wrap_mut(self)),
            ElementKind::Road => ElementMut::Road(RoadElement::wrap_mut(self)),
            ElementKind::Industry => ElementMut::Industry(IndustryElement::wrap_mut(self)),
        }
    }

    fn flag(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }

    fn set_flag(&mut self, bit: u8, state: bool) {
        if state {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }

    fn type_bits(&self, mask: u8, shift: u8) -> u8 {
        (self.type_byte >> shift) & mask
    }

    fn set_type_bits(&mut self, mask: u8, shift: u8, value: u8) {
        self.type_byte = (self.type_byte & !(mask << shift)) | ((value & mask) << shift);
    }

    fn data_bits(&self, byte: usize, mask: u8, shift: u8) -> u8 {
        (self.data[byte] >> shift) & mask
    }

    fn set_data_bits(&mut self, byte: usize, mask: u8, shift: u8, value: u8) {
        self.data[byte] = (self.data[byte] & !(mask << shift)) | ((value & mask) << shift);
    }

    fn data_u16(&self, byte: usize) -> u16 {
        u16::from_le_bytes([self.data[byte], self.data[byte + 1]])
    }

    fn set_data_u16(&mut self, byte: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.data[byte] = lo;
        self.data[byte + 1] = hi;
    }
}

impl fmt::Debug for TileElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileElement")
            .field("kind", &self.kind_checked())
            .field("base_z", &self.base_z)
            .field("clear_z", &self.clear_z)
            .field("flags", &format_args!("{:#04x}", self.flags))
            .field("data", &self.data)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Typed views
// ---------------------------------------------------------------------------

/// A typed view over a `TileElement` of one kind.
pub trait ElementView: TransparentWrapper<TileElement> {
    const KIND: ElementKind;
}

macro_rules! element_view {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, TransparentWrapper)]
        pub struct $name(TileElement);

        impl ElementView for $name {
            const KIND: ElementKind = $kind;
        }

        impl Deref for $name {
            type Target = TileElement;
            fn deref(&self) -> &TileElement {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut TileElement {
                &mut self.0
            }
        }
    };
}

element_view!(
    /// Terrain surface: slope, water level, terrain object, industry link.
    SurfaceElement,
    ElementKind::Surface
);
element_view!(
    /// One piece of a track segment.
    TrackElement,
    ElementKind::Track
);
element_view!(
    /// A station piece sitting on track/road, or an airport/dock tile.
    StationElement,
    ElementKind::Station
);
element_view!(
    /// Signals on both sides of a track piece.
    SignalElement,
    ElementKind::Signal
);
element_view!(
    /// One tile of a town building (1×1 or 2×2).
    BuildingElement,
    ElementKind::Building
);
element_view!(TreeElement, ElementKind::Tree);
element_view!(WallElement, ElementKind::Wall);
element_view!(
    /// One piece of a road segment.
    RoadElement,
    ElementKind::Road
);
element_view!(
    /// One tile of an industry building.
    IndustryElement,
    ElementKind::Industry
);

/// Exhaustive shared view over an element.
#[derive(Clone, Copy, Debug)]
pub enum ElementRef<'a> {
    Surface(&'a SurfaceElement),
    Track(&'a TrackElement),
    Station(&'a StationElement),
    Signal(&'a SignalElement),
    Building(&'a BuildingElement),
    Tree(&'a TreeElement),
    Wall(&'a WallElement),
    Road(&'a RoadElement),
    Industry(&'a IndustryElement),
}

/// Exhaustive mutable view over an element.
#[derive(Debug)]
pub enum ElementMut<'a> {
    Surface(&'a mut SurfaceElement),
    Track(&'a mut TrackElement),
    Station(&'a mut StationElement),
    Signal(&'a mut SignalElement),
    Building(&'a mut BuildingElement),
    Tree(&'a mut TreeElement),
    Wall(&'a mut WallElement),
    Road(&'a mut RoadElement),
    Industry(&'a mut IndustryElement),
}

// Slope bits stored in the low 5 bits of a surface's slope byte.
pub mod slope {
    pub const FLAT: u8 = 0x00;
    pub const ALL_CORNERS: u8 = 0x0F;
    pub const DOUBLE_HEIGHT: u8 = 1 << 4;

    pub const CORNER_UP_NORTH: u8 = 1 << 0;
    pub const CORNER_UP_EAST: u8 = 1 << 1;
    pub const CORNER_UP_SOUTH: u8 = 1 << 2;
    pub const CORNER_UP_WEST: u8 = 1 << 3;

    pub const CORNER_DOWN_WEST: u8 = ALL_CORNERS & !CORNER_UP_WEST;
    pub const CORNER_DOWN_SOUTH: u8 = ALL_CORNERS & !CORNER_UP_SOUTH;
    pub const CORNER_DOWN_EAST: u8 = ALL_CORNERS & !CORNER_UP_EAST;
    pub const CORNER_DOWN_NORTH: u8 = ALL_CORNERS & !CORNER_UP_NORTH;

    pub const SIDE_UP_NORTHEAST: u8 = CORNER_UP_NORTH | CORNER_UP_EAST;
    pub const SIDE_UP_SOUTHEAST: u8 = CORNER_UP_SOUTH | CORNER_UP_EAST;
    pub const SIDE_UP_NORTHWEST: u8 = CORNER_UP_NORTH | CORNER_UP_WEST;
    pub const SIDE_UP_SOUTHWEST: u8 = CORNER_UP_SOUTH | CORNER_UP_WEST;

    pub const VALLEY_WESTEAST: u8 = CORNER_UP_EAST | CORNER_UP_WEST;
    pub const VALLEY_NORTHSOUTH: u8 = CORNER_UP_NORTH | CORNER_UP_SOUTH;
}

impl SurfaceElement {
    /// Slope corners plus the double-height bit.
    pub fn slope(&self) -> u8 {
        self.data_bits(0, 0x1F, 0)
    }

    pub fn slope_corners(&self) -> u8 {
        self.data_bits(0, 0x0F, 0)
    }

    pub fn is_slope_double_height(&self) -> bool {
        self.slope() & slope::DOUBLE_HEIGHT != 0
    }

    pub fn set_slope(&mut self, value: u8) {
        self.0.set_data_bits(0, 0x1F, 0, value);
    }

    pub fn snow_coverage(&self) -> u8 {
        self.data_bits(0, 0x07, 5)
    }

    pub fn set_snow_coverage(&mut self, value: u8) {
        self.0.set_data_bits(0, 0x07, 5, value);
    }

    /// Highest storable water level.
    pub const MAX_WATER: u8 = 0x1F;

    /// Water level in micro z; zero means dry.
    pub fn water(&self) -> u8 {
        self.data_bits(1, Self::MAX_WATER, 0)
    }

    pub fn set_water(&mut self, level: u8) {
        self.0.set_data_bits(1, Self::MAX_WATER, 0, level);
    }

    /// Water surface in world height units.
    pub fn water_height(&self) -> i32 {
        i32::from(self.water()) * i32::from(crate::types::MICRO_Z_STEP)
    }

    pub fn terrain(&self) -> u8 {
        self.data_bits(2, 0x1F, 0)
    }

    pub fn set_terrain(&mut self, terrain: u8) {
        self.0.set_data_bits(2, 0x1F, 0, terrain);
    }

    /// Growth stage of the terrain decoration (grass regrowth, field crops).
    pub fn growth_stage(&self) -> u8 {
        self.data_bits(2, 0x07, 5)
    }

    pub fn set_growth_stage(&mut self, stage: u8) {
        self.0.set_data_bits(2, 0x07, 5, stage);
    }

    /// Terrain variation; shares its byte with `industry_id`.
    pub fn variation(&self) -> u8 {
        self.data[3]
    }

    pub fn set_variation(&mut self, variation: u8) {
        self.0.data[3] = variation;
    }

    /// Industry whose fields cover this surface; meaningful when `is_industrial()`.
    pub fn industry_id(&self) -> IndustryId {
        IndustryId(self.data[3])
    }

    pub fn set_industry(&mut self, industry: IndustryId) {
        self.0.data[3] = industry.0;
    }

    pub fn is_industrial(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn set_industrial(&mut self, state: bool) {
        self.0.set_type_bits(0x01, 7, u8::from(state));
    }
}

impl TrackElement {
    pub fn direction(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_direction(&mut self, direction: u8) {
        self.0.set_type_bits(0x03, 0, direction);
    }

    pub fn has_signal(&self) -> bool {
        self.type_bits(0x01, 6) != 0
    }

    pub fn set_has_signal(&mut self, state: bool) {
        self.0.set_type_bits(0x01, 6, u8::from(state));
    }

    pub fn has_station(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn set_has_station(&mut self, state: bool) {
        self.0.set_type_bits(0x01, 7, u8::from(state));
    }

    pub fn track_id(&self) -> u8 {
        self.data_bits(0, 0x3F, 0)
    }

    pub fn set_track_id(&mut self, id: u8) {
        self.0.set_data_bits(0, 0x3F, 0, id);
    }

    pub fn has_ghost_mods(&self) -> bool {
        self.data_bits(0, 0x01, 6) != 0
    }

    pub fn has_bridge(&self) -> bool {
        self.data_bits(0, 0x01, 7) != 0
    }

    pub fn sequence_index(&self) -> u8 {
        self.data_bits(1, 0x0F, 0)
    }

    pub fn set_sequence_index(&mut self, index: u8) {
        self.0.set_data_bits(1, 0x0F, 0, index);
    }

    pub fn track_object_id(&self) -> u8 {
        self.data_bits(1, 0x0F, 4)
    }

    pub fn set_track_object_id(&mut self, id: u8) {
        self.0.set_data_bits(1, 0x0F, 4, id);
    }

    /// Bridge object, if this piece is bridged.
    pub fn bridge(&self) -> Option<u8> {
        self.has_bridge().then(|| self.data_bits(2, 0x07, 5))
    }

    pub fn set_bridge(&mut self, bridge: Option<u8>) {
        self.0.set_data_bits(0, 0x01, 7, u8::from(bridge.is_some()));
        self.0.set_data_bits(2, 0x07, 5, bridge.unwrap_or(0));
    }

    pub fn owner(&self) -> CompanyId {
        CompanyId(self.data_bits(3, 0x0F, 0))
    }

    pub fn set_owner(&mut self, owner: CompanyId) {
        self.0.set_data_bits(3, 0x0F, 0, owner.0);
    }

    pub fn mods(&self) -> u8 {
        self.data_bits(3, 0x0F, 4)
    }

    pub fn set_mods(&mut self, mods: u8) {
        self.0.set_data_bits(3, 0x0F, 4, mods);
    }
}

/// What kind of station a station element belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationType {
    TrainStation,
    RoadStation,
    Airport,
    Docks,
}

impl StationType {
    const ALL: [StationType; 4] = [
        StationType::TrainStation,
        StationType::RoadStation,
        StationType::Airport,
        StationType::Docks,
    ];
}

impl StationElement {
    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.0.set_type_bits(0x03, 0, rotation);
    }

    pub fn multi_tile_index(&self) -> u8 {
        self.type_bits(0x03, 6)
    }

    pub fn set_multi_tile_index(&mut self, index: u8) {
        self.0.set_type_bits(0x03, 6, index);
    }

    pub fn owner(&self) -> CompanyId {
        CompanyId(self.data_bits(0, 0x0F, 0))
    }

    pub fn set_owner(&mut self, owner: CompanyId) {
        self.0.set_data_bits(0, 0x0F, 0, owner.0);
    }

    pub fn object_id(&self) -> u8 {
        self.data_bits(1, 0x1F, 0)
    }

    pub fn set_object_id(&mut self, id: u8) {
        self.0.set_data_bits(1, 0x1F, 0, id);
    }

    pub fn station_type(&self) -> StationType {
        // Three bits on disk, four variants; unused values read as docks.
        let raw = usize::from(self.data_bits(1, 0x07, 5));
        StationType::ALL.get(raw).copied().unwrap_or(StationType::Docks)
    }

    pub fn set_station_type(&mut self, station_type: StationType) {
        self.0.set_data_bits(1, 0x07, 5, station_type as u8);
    }

    pub fn station_id(&self) -> StationId {
        StationId(self.data_u16(2) & 0x3FF)
    }

    pub fn set_station_id(&mut self, id: StationId) {
        let kept = self.data_u16(2) & !0x3FF;
        self.0.set_data_u16(2, kept | (id.0 & 0x3FF));
    }
}

/// One side of a signal element (two bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalSide {
    raw: [u8; 2],
}

impl SignalSide {
    pub fn has_signal(&self) -> bool {
        self.raw[0] & 0x80 != 0
    }

    pub fn signal_object_id(&self) -> u8 {
        self.raw[0] & 0x0F
    }

    pub fn frame(&self) -> u8 {
        self.raw[1] & 0x0F
    }

    pub fn all_lights(&self) -> u8 {
        self.raw[1] >> 4
    }

    /// A side carrying a signal of the given object.
    pub fn with_signal(object_id: u8) -> Self {
        Self {
            raw: [0x80 | (object_id & 0x0F), 0],
        }
    }
}

impl SignalElement {
    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn is_left_ghost(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn is_right_ghost(&self) -> bool {
        self.type_bits(0x01, 6) != 0
    }

    pub fn left(&self) -> SignalSide {
        SignalSide {
            raw: [self.data[0], self.data[1]],
        }
    }

    pub fn right(&self) -> SignalSide {
        SignalSide {
            raw: [self.data[2], self.data[3]],
        }
    }

    pub fn set_left(&mut self, side: SignalSide) {
        self.0.data[0..2].copy_from_slice(&side.raw);
    }

    pub fn set_right(&mut self, side: SignalSide) {
        self.0.data[2..4].copy_from_slice(&side.raw);
    }
}

impl BuildingElement {
    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.0.set_type_bits(0x03, 0, rotation);
    }

    pub fn is_constructed(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn set_constructed(&mut self, state: bool) {
        self.0.set_type_bits(0x01, 7, u8::from(state));
    }

    pub fn object_id(&self) -> u8 {
        self.data[0]
    }

    pub fn set_object_id(&mut self, id: u8) {
        self.0.data[0] = id;
    }

    /// Which piece of a 2×2 building this is (0 is the origin tile).
    pub fn multi_tile_index(&self) -> u8 {
        self.data_bits(1, 0x03, 0)
    }

    pub fn set_multi_tile_index(&mut self, index: u8) {
        self.0.set_data_bits(1, 0x03, 0, index);
    }

    pub fn age(&self) -> u8 {
        (self.data_u16(2) & 0x3F) as u8
    }

    pub fn set_age(&mut self, age: u8) {
        let v = (self.data_u16(2) & !0x3F) | u16::from(age & 0x3F);
        self.0.set_data_u16(2, v);
    }

    pub fn variation(&self) -> u8 {
        ((self.data_u16(2) >> 6) & 0x1F) as u8
    }

    pub fn set_variation(&mut self, variation: u8) {
        let v = (self.data_u16(2) & !0x07C0) | (u16::from(variation & 0x1F) << 6);
        self.0.set_data_u16(2, v);
    }

    pub fn colour(&self) -> u8 {
        (self.data_u16(2) >> 11) as u8
    }

    pub fn set_colour(&mut self, colour: u8) {
        let v = (self.data_u16(2) & 0x07FF) | (u16::from(colour & 0x1F) << 11);
        self.0.set_data_u16(2, v);
    }
}

impl TreeElement {
    pub fn object_id(&self) -> u8 {
        self.data[0]
    }

    pub fn set_object_id(&mut self, id: u8) {
        self.0.data[0] = id;
    }

    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.0.set_type_bits(0x03, 0, rotation);
    }

    /// Quadrant of the tile the tree stands in.
    pub fn quadrant(&self) -> u8 {
        self.type_bits(0x03, 6)
    }

    pub fn set_quadrant(&mut self, quadrant: u8) {
        self.0.set_type_bits(0x03, 6, quadrant);
    }

    pub fn growth(&self) -> u8 {
        self.data_bits(1, 0x0F, 0)
    }

    pub fn set_growth(&mut self, growth: u8) {
        self.0.set_data_bits(1, 0x0F, 0, growth);
    }

    pub fn colour(&self) -> u8 {
        self.data_bits(2, 0x1F, 0)
    }

    pub fn set_colour(&mut self, colour: u8) {
        self.0.set_data_bits(2, 0x1F, 0, colour);
    }

    pub fn has_snow(&self) -> bool {
        self.data_bits(2, 0x01, 6) != 0
    }

    pub fn set_snow(&mut self, state: bool) {
        self.0.set_data_bits(2, 0x01, 6, u8::from(state));
    }

    pub fn season(&self) -> u8 {
        self.data_bits(3, 0x07, 3)
    }

    pub fn set_season(&mut self, season: u8) {
        self.0.set_data_bits(3, 0x07, 3, season);
    }
}

impl WallElement {
    pub fn object_id(&self) -> u8 {
        self.data[0]
    }

    pub fn set_object_id(&mut self, id: u8) {
        self.0.data[0] = id;
    }

    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.0.set_type_bits(0x03, 0, rotation);
    }
}

impl RoadElement {
    pub fn direction(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_direction(&mut self, direction: u8) {
        self.0.set_type_bits(0x03, 0, direction);
    }

    pub fn has_station(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn road_id(&self) -> u8 {
        self.data_bits(0, 0x0F, 0)
    }

    pub fn set_road_id(&mut self, id: u8) {
        self.0.set_data_bits(0, 0x0F, 0, id);
    }

    pub fn has_bridge(&self) -> bool {
        self.data_bits(0, 0x01, 7) != 0
    }

    pub fn sequence_index(&self) -> u8 {
        self.data_bits(1, 0x03, 0)
    }

    pub fn set_sequence_index(&mut self, index: u8) {
        self.0.set_data_bits(1, 0x03, 0, index);
    }

    pub fn road_object_id(&self) -> u8 {
        self.data_bits(1, 0x0F, 4)
    }

    pub fn set_road_object_id(&mut self, id: u8) {
        self.0.set_data_bits(1, 0x0F, 4, id);
    }

    pub fn bridge(&self) -> Option<u8> {
        self.has_bridge().then(|| self.data_bits(2, 0x07, 5))
    }

    pub fn set_bridge(&mut self, bridge: Option<u8>) {
        self.0.set_data_bits(0, 0x01, 7, u8::from(bridge.is_some()));
        self.0.set_data_bits(2, 0x07, 5, bridge.unwrap_or(0));
    }

    pub fn owner(&self) -> CompanyId {
        CompanyId(self.data_bits(3, 0x0F, 0))
    }

    pub fn set_owner(&mut self, owner: CompanyId) {
        self.0.set_data_bits(3, 0x0F, 0, owner.0);
    }

    pub fn has_level_crossing(&self) -> bool {
        self.data_bits(3, 0x01, 5) != 0
    }

    pub fn mods(&self) -> u8 {
        self.data_bits(3, 0x03, 6)
    }
}

impl IndustryElement {
    pub fn industry_id(&self) -> IndustryId {
        IndustryId(self.data[0])
    }

    pub fn set_industry_id(&mut self, id: IndustryId) {
        self.0.data[0] = id.0;
    }

    pub fn rotation(&self) -> u8 {
        self.type_bits(0x03, 0)
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.0.set_type_bits(0x03, 0, rotation);
    }

    pub fn is_constructed(&self) -> bool {
        self.type_bits(0x01, 7) != 0
    }

    pub fn set_constructed(&mut self, state: bool) {
        self.0.set_type_bits(0x01, 7, u8::from(state));
    }

    pub fn sequence_index(&self) -> u8 {
        self.data_bits(1, 0x03, 0)
    }

    pub fn set_sequence_index(&mut self, index: u8) {
        self.0.set_data_bits(1, 0x03, 0, index);
    }
}
