// Land and water height edits for a single tile.
//
// Both commands follow the same shape: validate the target against the
// world's terraform bounds, price the change, clear the affected volume with
// the default-collision clear function (trees and buildings are demolished
// and charged, anything else blocks), and only then touch the surface. A
// query prices and validates; an apply also mutates. A failure at any step
// returns `None` with the error text set on the context; demolitions already
// made by a failed apply are kept.
//
// See also: `clearance.rs` for the volume checks, `survey.rs` for the wall
// and industry cleanups run before a surface moves.

use crate::clearance::{
    ClearFuncResult, RemovedBuildings, apply_clear_at_standard_height, clear_with_default_collision,
};
use crate::command::{CommandContext, ErrorText};
use crate::element::{ElementKind, SurfaceElement};
use crate::quarter_tile::QuarterTile;
use crate::store::ElementId;
use crate::surface::surface_clear_z;
use crate::survey::{remove_all_walls_on_tile, remove_surface_industry};
use crate::types::{Currency, MICRO_TO_SMALL_Z_STEP, SMALL_Z_STEP, SmallZ, WorldPos};
use crate::world::World;

/// Move the surface at `pos` to `target_base_z` with the given slope.
/// Charges the land's terraform cost once per height step moved (at least
/// once, for a slope-only change).
pub fn adjust_surface_height(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    target_base_z: SmallZ,
    slope: u8,
    removed_buildings: &mut RemovedBuildings,
) -> Option<Currency> {
    if target_base_z < world.config.min_land_z {
        ctx.set_error(ErrorText::TooLow);
        return None;
    }
    if target_base_z >= world.config.max_land_z {
        ctx.set_error(ErrorText::TooHigh);
        return None;
    }
    let tile_pos = pos.tile();
    let Some(surface) = world.store.get(tile_pos).surface().copied() else {
        ctx.set_error(ErrorText::OffEdgeOfMap);
        return None;
    };

    let delta = i32::from(target_base_z) - i32::from(surface.base_z());
    let steps = delta.abs() / i32::from(SMALL_Z_STEP);
    let mut cost = world
        .objects
        .land(surface.terrain())
        .map_or(0, |land| world.economy.price(land.cost, 8) * steps.max(1));

    // Old and new surface plus whatever stands on the old one.
    let new_clear_z = surface_clear_z(target_base_z, slope);
    let base_z = target_base_z.min(surface.base_z());
    let clear_z = new_clear_z
        .max(surface.clear_z())
        .max(surface.base_z().saturating_add(SMALL_Z_STEP));
    let mut clear_cost = 0;
    let mut clear = |w: &mut World, c: &mut CommandContext, id: ElementId| {
        // Walls go with the old surface below.
        if w.store.element(id).is_some_and(|el| el.kind() == ElementKind::Wall) {
            return ClearFuncResult::NoCollision;
        }
        clear_with_default_collision(w, c, id, pos, removed_buildings, &mut clear_cost)
    };
    if !apply_clear_at_standard_height(
        world,
        ctx,
        pos,
        base_z,
        clear_z,
        QuarterTile::new(0xF, 0),
        Some(&mut clear),
    ) {
        return None;
    }
    cost += clear_cost;

    if ctx.flags.is_apply() && !ctx.flags.is_ghost() {
        remove_all_walls_on_tile(&mut world.store, ctx, tile_pos, surface.base_z());
        remove_surface_industry(&mut world.store, ctx, pos);
        let surface = world.store.surface_mut(tile_pos)?;
        surface.set_base_z(target_base_z);
        surface.set_clear_z(new_clear_z);
        surface.set_slope(slope);
        let water_z = u16::from(surface.water()) * u16::from(MICRO_TO_SMALL_Z_STEP);
        if water_z <= u16::from(target_base_z) {
            surface.set_water(0);
        }
        world.store.sort_tile(tile_pos);
        log::debug!("surface at {tile_pos} moved to z {target_base_z} slope {slope:#04x}");
    }
    Some(cost)
}

/// Set the water level at `pos` to `target_height` (small z, rounded down to
/// a whole water step). Water at or below the land drains away. Charges the
/// water cost once per water step changed. Levels above
/// `SurfaceElement::MAX_WATER` are too high.
pub fn adjust_water_height(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    target_height: SmallZ,
    removed_buildings: &mut RemovedBuildings,
) -> Option<Currency> {
    let target = target_height - target_height % MICRO_TO_SMALL_Z_STEP;
    if target != 0 && target < world.config.min_land_z {
        ctx.set_error(ErrorText::TooLow);
        return None;
    }
    let too_deep = target / MICRO_TO_SMALL_Z_STEP > SurfaceElement::MAX_WATER;
    if target >= world.config.max_land_z || too_deep {
        ctx.set_error(ErrorText::TooHigh);
        return None;
    }
    let tile_pos = pos.tile();
    let Some(surface) = world.store.get(tile_pos).surface().copied() else {
        ctx.set_error(ErrorText::OffEdgeOfMap);
        return None;
    };

    let new_level = if target > surface.base_z() {
        target / MICRO_TO_SMALL_Z_STEP
    } else {
        0
    };
    let steps = (i32::from(new_level) - i32::from(surface.water())).abs();
    let mut cost = world.economy.price(world.objects.water_cost, 8) * steps;

    if new_level != 0 {
        let mut clear_cost = 0;
        let mut clear = |w: &mut World, c: &mut CommandContext, id: ElementId| {
            clear_with_default_collision(w, c, id, pos, removed_buildings, &mut clear_cost)
        };
        if !apply_clear_at_standard_height(
            world,
            ctx,
            pos,
            surface.base_z(),
            target,
            QuarterTile::new(0xF, 0xF),
            Some(&mut clear),
        ) {
            return None;
        }
        cost += clear_cost;
    }

    if ctx.flags.is_apply() && !ctx.flags.is_ghost() {
        if let Some(surface) = world.store.surface_mut(tile_pos) {
            surface.set_water(new_level);
        }
    }
    Some(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::element::slope;
    use crate::event::WorldEvent;
    use crate::objects::ObjectCatalog;
    use crate::types::CompanyId;

    const POS: WorldPos = WorldPos::new(4 * 32, 4 * 32);

    fn world() -> World {
        World::new(WorldConfig::small(10, 10), ObjectCatalog::sample())
    }

    #[test]
    fn bounds_are_enforced() {
        let mut w = world();
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::query(CompanyId(0));
        assert_eq!(adjust_surface_height(&mut w, &mut ctx, POS, 0, 0, &mut removed), None);
        assert_eq!(ctx.error, Some(ErrorText::TooLow));
        assert_eq!(adjust_surface_height(&mut w, &mut ctx, POS, 160, 0, &mut removed), None);
        assert_eq!(ctx.error, Some(ErrorText::TooHigh));
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 200, &mut removed), None);
        assert_eq!(ctx.error, Some(ErrorText::TooHigh));
    }

    #[test]
    fn query_prices_without_touching_the_map() {
        let mut w = world();
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::query(CompanyId(0));
        // Two steps of grass at 1024 each.
        assert_eq!(adjust_surface_height(&mut w, &mut ctx, POS, 12, 0, &mut removed), Some(2048));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().base_z(), 4);
    }

    #[test]
    fn raise_moves_surface_and_keeps_run_sorted() {
        let mut w = world();
        let tile = POS.tile();
        let id = w.store.insert_element(ElementKind::Wall, tile, 6, 0x1).unwrap();
        w.store.element_mut(id).unwrap().set_clear_z(10);
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        let west_up = slope::CORNER_UP_WEST;
        let cost = adjust_surface_height(&mut w, &mut ctx, POS, 8, west_up, &mut removed);
        assert_eq!(cost, Some(1024));
        let run = w.store.get(tile);
        let surface = run.surface().unwrap();
        assert_eq!(surface.base_z(), 8);
        assert_eq!(surface.clear_z(), 12);
        assert_eq!(surface.slope(), west_up);
        assert_eq!(run.len(), 1);
        w.store.validate().unwrap();
    }

    #[test]
    fn raising_under_a_track_is_blocked() {
        let mut w = world();
        let id = w.store.insert_element(ElementKind::Track, POS.tile(), 4, 0xF).unwrap();
        w.store.element_mut(id).unwrap().set_clear_z(8);
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        assert_eq!(adjust_surface_height(&mut w, &mut ctx, POS, 8, 0, &mut removed), None);
        assert_eq!(ctx.error, Some(ErrorText::InTheWay("Standard Track".into())));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().base_z(), 4);
    }

    #[test]
    fn lowering_clears_trees_and_drops_industry() {
        let mut w = world();
        let tile = POS.tile();
        {
            let surface = w.store.surface_mut(tile).unwrap();
            surface.set_base_z(12);
            surface.set_clear_z(12);
            surface.set_industrial(true);
        }
        let tree = w.store.insert_element(ElementKind::Tree, tile, 12, 0xF).unwrap();
        w.store.element_mut(tree).unwrap().set_clear_z(20);
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        // Two grass steps plus the tree.
        assert_eq!(adjust_surface_height(&mut w, &mut ctx, POS, 4, 0, &mut removed), Some(3072));
        let run = w.store.get(tile);
        assert_eq!(run.len(), 1);
        assert!(!run.surface().unwrap().is_industrial());
        assert!(matches!(ctx.events[0], WorldEvent::TreeRemoved { .. }));
        assert!(matches!(ctx.events[1], WorldEvent::SurfaceIndustryRemoved { .. }));
    }

    #[test]
    fn flood_and_drain() {
        let mut w = world();
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        // Land at 4, water to 13 rounds to 12: three water steps.
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 13, &mut removed), Some(3 * 2048));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().water(), 3);
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 0, &mut removed), Some(3 * 2048));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().water(), 0);
    }

    #[test]
    fn water_above_the_storable_level_is_too_high() {
        let mut w = world();
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        // Level 35 would not fit in the surface's water bits.
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 140, &mut removed), None);
        assert_eq!(ctx.error, Some(ErrorText::TooHigh));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().water(), 0);
        assert!(ctx.events.is_empty());

        // The highest storable level still works.
        let mut ctx = CommandContext::apply(CompanyId(0));
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 127, &mut removed), Some(31 * 2048));
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().water(), 31);
    }

    #[test]
    fn flooding_a_track_is_blocked() {
        let mut w = world();
        let id = w.store.insert_element(ElementKind::Track, POS.tile(), 4, 0xF).unwrap();
        w.store.element_mut(id).unwrap().set_clear_z(8);
        let mut removed = RemovedBuildings::new();
        let mut ctx = CommandContext::apply(CompanyId(0));
        assert_eq!(adjust_water_height(&mut w, &mut ctx, POS, 12, &mut removed), None);
        assert_eq!(w.store.get(POS.tile()).surface().unwrap().water(), 0);
    }
}
