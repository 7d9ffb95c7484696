// Side-effect events emitted by map mutations.
//
// Clearing a tile can have consequences outside the map store: demolishing a
// town building lowers the town's population and rating, removing an
// industry's fields changes the town's info, removing trees changes the
// landscape. The store doesn't know about towns, so these are pushed onto
// `CommandContext::events` as `WorldEvent`s and the outer layer forwards
// them. Ghost previews never emit events.
//
// See also: `command.rs` for `CommandContext`, `clearance.rs` and
// `terraform.rs` which emit these.

use crate::types::{IndustryId, Pos3, TilePos, WorldPos};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    TreeRemoved {
        pos: WorldPos,
        object_id: u8,
    },
    /// A whole building (every tile of it) was removed.
    BuildingDemolished {
        origin: Pos3,
        object_id: u8,
        /// Finished buildings count toward town population.
        constructed: bool,
        /// Part of a larger clearing; the town rating hit is skipped.
        nested: bool,
    },
    /// The surface at `pos` stopped belonging to an industry's fields.
    SurfaceIndustryRemoved {
        pos: WorldPos,
        industry: IndustryId,
    },
    WallsRemoved {
        pos: TilePos,
        count: usize,
    },
}
