// Construction scenarios run through the real clearance engine.
//
// Each test sets up a small flat map with `TestWorld`, places obstacles
// directly, then runs query and/or apply construction steps the way a build
// command would, checking the result, the pending error text, the price, and
// what is left on the tile.

use loco_map::clearance::{
    ClearFuncResult, RemovedBuildings, apply_clear_at_standard_height, can_construct_at,
    clear_with_default_collision,
};
use loco_map::command::{CommandContext, CommandFlags, ElementPositionFlags, ErrorText};
use loco_map::element::{ElementKind, TrackElement, TreeElement};
use loco_map::event::WorldEvent;
use loco_map::quarter_tile::QuarterTile;
use loco_map::store::ElementId;
use loco_map::types::{Pos3, TilePos, WorldPos};
use loco_map::world::World;
use scenario_tests::{AI, PLAYER, TestWorld};

const SIZE: i32 = 12;

/// Tree clear cost: (4096 * 1024) >> 12.
const TREE_COST: i32 = 1024;
/// Office block clear cost: (1024 * 1024) >> 8.
const OFFICE_COST: i32 = 4096;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn simple_build_on_empty_tile() {
    init_logging();
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(5, 5);
    let mut removed = RemovedBuildings::new();

    let before = t.snapshot_json();
    let mut query = CommandContext::query(PLAYER);
    let outcome = t.build(&mut query, tile, 4, 8, &mut removed);
    assert_eq!(outcome.cost, 0);
    assert_eq!(outcome.placed, None);
    assert_eq!(query.error, None);
    assert_eq!(t.snapshot_json(), before);

    let mut apply = CommandContext::apply(PLAYER);
    let outcome = t.build(&mut apply, tile, 4, 8, &mut removed);
    assert!(outcome.placed.is_some());
    assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Track]);
    t.world.store.validate().unwrap();

    // The same volume is now taken.
    let mut again = CommandContext::query(PLAYER);
    assert_eq!(t.build(&mut again, tile, 4, 8, &mut removed).placed, None);
    assert_eq!(again.error, Some(ErrorText::InTheWay("Standard Track".into())));
}

#[test]
fn demolish_tree_and_build_under_unrelated_element() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(4, 6);
    t.place(ElementKind::Tree, tile, 4, 16, 0xF);
    // A wall well above, in another quarter, survives the rescan.
    t.place(ElementKind::Wall, tile, 40, 48, 0x1);
    let mut removed = RemovedBuildings::new();

    let mut query = CommandContext::query(PLAYER);
    let outcome = t.build(&mut query, tile, 4, 8, &mut removed);
    assert_eq!(outcome.cost, TREE_COST);
    assert_eq!(t.kinds(tile).len(), 3);

    let mut apply = CommandContext::apply(PLAYER);
    let outcome = t.build(&mut apply, tile, 4, 8, &mut removed);
    assert_eq!(outcome.cost, TREE_COST);
    assert!(outcome.placed.is_some());
    assert_eq!(
        t.kinds(tile),
        vec![ElementKind::Surface, ElementKind::Track, ElementKind::Wall]
    );
    assert_eq!(
        apply.events,
        vec![WorldEvent::TreeRemoved {
            pos: WorldPos::from(tile),
            object_id: 0
        }]
    );
}

#[test]
fn tree_removal_restarts_the_scan() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(6, 4);
    let pos = WorldPos::from(tile);
    let full = QuarterTile::new(0xF, 0);

    let mut ctx = CommandContext::query(PLAYER);
    assert!(can_construct_at(&mut t.world, &mut ctx, pos, 40, 80, full));

    t.place(ElementKind::Tree, tile, 40, 56, 0b0001);
    t.place(ElementKind::Wall, tile, 100, 108, 0b0001);
    let mut removed = RemovedBuildings::new();
    let mut cost = 0;
    let mut results = Vec::new();
    let mut clear = |w: &mut World, c: &mut CommandContext, id: ElementId| {
        let res = clear_with_default_collision(w, c, id, pos, &mut removed, &mut cost);
        results.push(res);
        res
    };
    let mut ctx = CommandContext::apply(PLAYER);
    assert!(apply_clear_at_standard_height(
        &mut t.world,
        &mut ctx,
        pos,
        40,
        80,
        full,
        Some(&mut clear)
    ));
    // One removal, then a clean rescan that never reaches the clear function.
    assert_eq!(results, vec![ClearFuncResult::CollisionRemoved]);
    assert_eq!(cost, TREE_COST);
    assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Wall]);
}

#[test]
fn removing_topmost_obstacle_ends_the_scan() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(3, 3);
    t.place(ElementKind::Tree, tile, 4, 16, 0x3);
    let tree = t.world.store.get(tile).id(1).unwrap();
    t.element_mut(tree)
        .as_kind_mut::<TreeElement>()
        .unwrap()
        .set_object_id(0);
    let mut removed = RemovedBuildings::new();
    let mut apply = CommandContext::apply(PLAYER);
    let outcome = t.build(&mut apply, tile, 4, 8, &mut removed);
    assert!(outcome.placed.is_some());
    assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Track]);
}

#[test]
fn large_building_is_charged_once_per_command() {
    let mut t = TestWorld::new(SIZE);
    let origin = TilePos::new(3, 3);
    t.place_building(origin, 4, 20, 1);
    let tiles = [
        TilePos::new(3, 3),
        TilePos::new(3, 4),
        TilePos::new(4, 4),
        TilePos::new(4, 3),
    ];

    // Query: every tile hits a piece, only the first is charged.
    let mut removed = RemovedBuildings::new();
    let mut query = CommandContext::query(PLAYER);
    let total: i32 = tiles
        .iter()
        .map(|&tile| t.build(&mut query, tile, 4, 8, &mut removed).cost)
        .sum();
    assert_eq!(total, OFFICE_COST);
    assert_eq!(removed.len(), 1);
    for tile in tiles {
        assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Building]);
    }

    // Apply: the first tile demolishes the whole block.
    let mut removed = RemovedBuildings::new();
    let mut apply = CommandContext::apply(PLAYER);
    let total: i32 = tiles
        .iter()
        .map(|&tile| t.build(&mut apply, tile, 4, 8, &mut removed).cost)
        .sum();
    assert_eq!(total, OFFICE_COST);
    for tile in tiles {
        assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Track]);
    }
    assert_eq!(
        apply.events,
        vec![WorldEvent::BuildingDemolished {
            origin: Pos3::new(96, 96, 16),
            object_id: 1,
            constructed: true,
            nested: true,
        }]
    );
    t.world.store.validate().unwrap();
}

#[test]
fn stacked_buildings_sharing_an_origin_are_charged_once() {
    let mut t = TestWorld::new(SIZE);
    let origin = TilePos::new(3, 3);
    t.place_building(origin, 4, 20, 1);
    t.place_building(origin, 4, 20, 1);
    let tiles = [
        TilePos::new(3, 3),
        TilePos::new(3, 4),
        TilePos::new(4, 4),
        TilePos::new(4, 3),
    ];
    for tile in tiles {
        assert_eq!(
            t.kinds(tile),
            vec![ElementKind::Surface, ElementKind::Building, ElementKind::Building]
        );
    }

    // The first tile demolishes one block and clears the second block's
    // piece there; the other tiles only hold leftover pieces of the second.
    let mut removed = RemovedBuildings::new();
    let mut apply = CommandContext::apply(PLAYER);
    let mut total = 0;
    for tile in tiles {
        let outcome = t.build(&mut apply, tile, 4, 8, &mut removed);
        assert!(outcome.placed.is_some(), "nothing placed on {tile}");
        total += outcome.cost;
    }
    assert_eq!(total, OFFICE_COST);
    assert_eq!(removed.len(), 1);
    for tile in tiles {
        assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Track]);
    }
    let demolished = apply
        .events
        .iter()
        .filter(|e| matches!(e, WorldEvent::BuildingDemolished { .. }))
        .count();
    assert_eq!(demolished, 1);
    t.world.store.validate().unwrap();
}

#[test]
fn company_headquarters_blocks_construction() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(6, 6);
    t.place_building(tile, 4, 24, 2);
    let mut removed = RemovedBuildings::new();
    let mut apply = CommandContext::apply(PLAYER);
    let outcome = t.build(&mut apply, tile, 4, 8, &mut removed);
    assert_eq!(outcome.placed, None);
    assert_eq!(outcome.cost, 0);
    assert_eq!(
        apply.error,
        Some(ErrorText::InTheWay("Company Headquarters".into()))
    );
}

#[test]
fn ghost_preview_prices_but_leaves_obstacles() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(5, 7);
    t.place_building(tile, 4, 16, 0);
    let mut removed = RemovedBuildings::new();
    let mut ghost = CommandContext::new(CommandFlags::APPLY | CommandFlags::GHOST, PLAYER);
    let outcome = t.build(&mut ghost, tile, 20, 24, &mut removed);
    // Above the cottage, so nothing to clear; the preview is placed.
    assert!(outcome.placed.is_some());
    assert!(t.world.store.element(outcome.placed.unwrap()).unwrap().is_ghost());

    // Ghosts never block real construction.
    let mut query = CommandContext::query(PLAYER);
    assert!(can_construct_at(
        &mut t.world,
        &mut query,
        WorldPos::from(tile),
        20,
        24,
        QuarterTile::new(0xF, 0)
    ));

    // A ghost clearing through the cottage prices it but leaves it standing.
    let mut removed = RemovedBuildings::new();
    let mut ghost = CommandContext::new(CommandFlags::APPLY | CommandFlags::GHOST, PLAYER);
    let outcome = t.build(&mut ghost, tile, 4, 8, &mut removed);
    assert_eq!(outcome.cost, 2048);
    assert!(t.kinds(tile).contains(&ElementKind::Building));
    assert!(ghost.events.is_empty());
}

#[test]
fn water_line_rules() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(5, 5);
    // Water surface at small z 12 over land at 4.
    t.world.store.surface_mut(tile).unwrap().set_water(3);
    let pos = WorldPos::from(tile);
    let full = QuarterTile::new(0xF, 0);

    let mut ctx = CommandContext::query(PLAYER);
    assert!(!can_construct_at(&mut t.world, &mut ctx, pos, 4, 20, full));
    assert_eq!(ctx.error, Some(ErrorText::CannotBuildPartlyAboveBelowWater));

    // Entirely below the water line.
    let mut ctx = CommandContext::query(PLAYER);
    assert!(can_construct_at(&mut t.world, &mut ctx, pos, 4, 12, full));
    assert!(ctx.position_flags.contains(ElementPositionFlags::UNDERWATER));

    // Entirely above it.
    let mut ctx = CommandContext::query(PLAYER);
    assert!(can_construct_at(&mut t.world, &mut ctx, pos, 16, 20, full));
    assert!(!ctx.position_flags.contains(ElementPositionFlags::PARTIALLY_UNDERWATER));
}

#[test]
fn human_player_preempts_ai_plan() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(7, 4);
    let id = t.place(ElementKind::Track, tile, 4, 8, 0xF);
    {
        let el = t.element_mut(id);
        el.set_ai_allocated(true);
        el.as_kind_mut::<TrackElement>().unwrap().set_owner(AI);
    }

    // The AI's rival cannot take the tile.
    let mut rival = CommandContext::query(loco_map::types::CompanyId(2));
    let mut removed = RemovedBuildings::new();
    assert_eq!(t.build(&mut rival, tile, 4, 8, &mut removed).placed, None);
    assert_eq!(rival.error, Some(ErrorText::AnotherCompanyAboutToBuildHere));

    // The human can, and the AI is told its plan was pre-empted.
    let mut apply = CommandContext::apply(PLAYER);
    assert!(t.build(&mut apply, tile, 4, 8, &mut removed).placed.is_some());
    assert!(t.world.companies.get(AI).unwrap().ai_plan_preempted);
}

#[test]
fn off_edge_of_map() {
    let mut t = TestWorld::new(SIZE);
    let mut removed = RemovedBuildings::new();
    for tile in [
        TilePos::new(0, 5),
        TilePos::new(5, 0),
        TilePos::new(SIZE - 1, 5),
        TilePos::new(5, SIZE - 1),
    ] {
        let mut ctx = CommandContext::apply(PLAYER);
        assert_eq!(t.build(&mut ctx, tile, 4, 8, &mut removed).placed, None);
        assert_eq!(ctx.error, Some(ErrorText::OffEdgeOfMap));
    }
}

#[test]
fn any_height_clearance_removes_trees_far_above() {
    let mut t = TestWorld::new(SIZE);
    let tile = TilePos::new(8, 8);
    t.place(ElementKind::Tree, tile, 60, 80, 0x8);
    let mut removed = RemovedBuildings::new();

    let mut standard = CommandContext::query(PLAYER);
    assert_eq!(t.build(&mut standard, tile, 4, 8, &mut removed).cost, 0);

    let mut apply = CommandContext::apply(PLAYER);
    let outcome = t.build_with(
        &mut apply,
        tile,
        4,
        8,
        QuarterTile::new(0x1, 0),
        true,
        &mut removed,
    );
    assert_eq!(outcome.cost, TREE_COST);
    assert_eq!(t.kinds(tile), vec![ElementKind::Surface, ElementKind::Track]);
}

#[test]
fn full_arena_reports_landscape_data_area_full() {
    let mut t = TestWorld::from_config_json(
        r#"{"rows": 6, "columns": 6, "elements_per_tile": 1, "free_slack": 4}"#,
    );
    let mut removed = RemovedBuildings::new();
    let mut ctx = CommandContext::apply(PLAYER);
    assert_eq!(t.build(&mut ctx, TilePos::new(2, 2), 4, 8, &mut removed).placed, None);
    assert_eq!(ctx.error, Some(ErrorText::LandscapeDataAreaFull));
    assert_eq!(ErrorText::LandscapeDataAreaFull.to_string(), "Landscape data area full");
}
