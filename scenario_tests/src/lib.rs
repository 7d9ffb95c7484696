// Test-only map harness for construction scenario tests.
//
// Wraps a real `World` (store, catalog, economy, companies) and exposes the
// handful of steps a construction command is made of: make room, clear the
// volume with the default clear function, then insert the new element. The
// clearance and insertion code is the library's own; the only test-specific
// code here is element setup and the bookkeeping a command would carry.
//
// See also: `tests/clearance_scenarios.rs` and `tests/store_properties.rs`.

use loco_map::clearance::{
    RemovedBuildings, apply_clear_at_all_heights, apply_clear_at_standard_height,
    clear_with_default_collision,
};
use loco_map::command::CommandContext;
use loco_map::company::Company;
use loco_map::config::WorldConfig;
use loco_map::element::{BuildingElement, ElementKind, TileElement};
use loco_map::objects::ObjectCatalog;
use loco_map::quarter_tile::QuarterTile;
use loco_map::store::ElementId;
use loco_map::types::{CompanyId, Currency, MULTI_TILE_OFFSETS, SmallZ, TilePos, WorldPos};
use loco_map::world::World;

/// The human player in every scenario.
pub const PLAYER: CompanyId = CompanyId(0);
/// An AI company with a plan on the map.
pub const AI: CompanyId = CompanyId(1);

/// Outcome of one `build` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutcome {
    pub placed: Option<ElementId>,
    pub cost: Currency,
}

pub struct TestWorld {
    pub world: World,
}

impl TestWorld {
    /// A flat `size` x `size` map with the sample catalog, one human player
    /// and one AI company.
    pub fn new(size: i32) -> Self {
        let mut world = World::new(WorldConfig::small(size, size), ObjectCatalog::sample());
        world.companies.insert(
            PLAYER,
            Company {
                is_player: true,
                ..Company::default()
            },
        );
        world.companies.insert(AI, Company::default());
        Self { world }
    }

    /// Build a config from JSON the way a game would load it.
    pub fn from_config_json(json: &str) -> Self {
        let config = WorldConfig::from_json(json).expect("bad test config");
        Self {
            world: World::new(config, ObjectCatalog::sample()),
        }
    }

    /// Insert an element directly, with its clearance height.
    pub fn place(
        &mut self,
        kind: ElementKind,
        tile: TilePos,
        base_z: SmallZ,
        clear_z: SmallZ,
        quarters: u8,
    ) -> ElementId {
        let id = self
            .world
            .store
            .insert_element(kind, tile, base_z, quarters)
            .expect("insert failed");
        self.element_mut(id).set_clear_z(clear_z);
        id
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut TileElement {
        self.world.store.element_mut(id).expect("stale test handle")
    }

    /// Place every piece of a building whose origin is `origin`: one piece
    /// for a small building, four for a large one.
    pub fn place_building(
        &mut self,
        origin: TilePos,
        base_z: SmallZ,
        clear_z: SmallZ,
        object_id: u8,
    ) {
        let large = self
            .world
            .objects
            .building(object_id)
            .is_some_and(|b| b.is_large);
        let pieces = if large { 4 } else { 1 };
        for (index, offset) in MULTI_TILE_OFFSETS.iter().enumerate().take(pieces) {
            let tile = (origin.to_world() + *offset).tile();
            let id = self.place(ElementKind::Building, tile, base_z, clear_z, 0xF);
            let building = self
                .element_mut(id)
                .as_kind_mut::<BuildingElement>()
                .expect("not a building");
            building.set_object_id(object_id);
            building.set_multi_tile_index(index as u8);
            building.set_constructed(true);
        }
    }

    /// Run one construction step for a full-tile volume: make room, clear
    /// with the default clear function, and on apply insert a track.
    pub fn build(
        &mut self,
        ctx: &mut CommandContext,
        tile: TilePos,
        base_z: SmallZ,
        clear_z: SmallZ,
        removed: &mut RemovedBuildings,
    ) -> BuildOutcome {
        self.build_with(ctx, tile, base_z, clear_z, QuarterTile::new(0xF, 0), false, removed)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build_with(
        &mut self,
        ctx: &mut CommandContext,
        tile: TilePos,
        base_z: SmallZ,
        clear_z: SmallZ,
        qt: QuarterTile,
        any_height: bool,
        removed: &mut RemovedBuildings,
    ) -> BuildOutcome {
        let mut outcome = BuildOutcome {
            placed: None,
            cost: 0,
        };
        if !self.world.check_free_elements_and_reorganise(ctx) {
            return outcome;
        }
        let pos = WorldPos::from(tile);
        let mut cost = 0;
        let mut clear = |w: &mut World, c: &mut CommandContext, id: ElementId| {
            clear_with_default_collision(w, c, id, pos, removed, &mut cost)
        };
        let world = &mut self.world;
        let ok = if any_height {
            apply_clear_at_all_heights(world, ctx, pos, base_z, clear_z, qt, Some(&mut clear))
        } else {
            apply_clear_at_standard_height(world, ctx, pos, base_z, clear_z, qt, Some(&mut clear))
        };
        outcome.cost = cost;
        if !ok {
            return outcome;
        }
        if ctx.flags.is_apply() {
            let id = self
                .world
                .store
                .insert_element(ElementKind::Track, tile, base_z, qt.base_quarter_occupied())
                .expect("insert after clearance failed");
            let el = self.element_mut(id);
            el.set_clear_z(clear_z);
            el.set_ghost(ctx.flags.is_ghost());
            outcome.placed = Some(id);
        }
        outcome
    }

    /// Kinds on a tile, bottom to top.
    pub fn kinds(&self, tile: TilePos) -> Vec<ElementKind> {
        self.world.store.get(tile).iter().map(|el| el.kind()).collect()
    }

    /// The store as JSON, for diffing two worlds in assertions.
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.world.store.snapshot()).expect("snapshot serialises")
    }
}
