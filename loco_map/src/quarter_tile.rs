// Packed footprint mask for sub-tile collision.
//
// A tile is split into four horizontal quadrants (bit 0 north, bit 1 east,
// bit 2 south, bit 3 west). `QuarterTile` packs two 4-bit masks into one
// byte: the low nibble is the footprint (which quadrants the volume
// occupies), the high nibble marks quadrants the volume only occupies at its
// upper z, which lets it sit over a raised surface corner.
//
// Rotation turns both nibbles by the same number of quadrant positions. Each
// rotation amount has its own pair of masks so bits shifted out of one nibble
// never bleed into the other.
//
// See also: `clearance.rs` for how the masks are tested against surfaces and
// other elements, `element.rs` where the footprint nibble is stored in each
// element's flags byte.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterTile(u8);

impl QuarterTile {
    /// Build from a footprint mask and a z-only mask (both 4-bit).
    pub const fn new(base_quarters: u8, z_quarters: u8) -> Self {
        Self((base_quarters & 0xF) | ((z_quarters & 0xF) << 4))
    }

    pub const fn from_raw(value: u8) -> Self {
        Self(value)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn base_quarter_occupied(self) -> u8 {
        self.0 & 0xF
    }

    pub const fn z_quarter_occupied(self) -> u8 {
        (self.0 >> 4) & 0xF
    }

    /// Rotate both masks clockwise by `amount` quadrants. Amounts outside
    /// `1..=3` leave the value unchanged.
    pub const fn rotate(self, amount: u8) -> Self {
        let v = self.0;
        match amount {
            1 => Self(((v << 1) & 0xEE) | ((v >> 3) & 0x11)),
            2 => Self(((v << 2) & 0xCC) | ((v >> 2) & 0x33)),
            3 => Self(((v << 3) & 0x88) | ((v >> 1) & 0x77)),
            _ => self,
        }
    }
}
