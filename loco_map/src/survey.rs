// Read-mostly map queries used by the town, industry and AI layers, plus two
// small tile cleanups the terraform commands need.
//
// The area queries all scan an 11x11 block of tiles centred on the given
// tile and silently skip positions outside the map.
//
// See also: `surface.rs` for point height queries, `terraform.rs` for the
// callers of `remove_all_walls_on_tile` and `remove_surface_industry`.

use crate::command::CommandContext;
use crate::element::{ElementRef, TrackElement, TreeElement};
use crate::event::WorldEvent;
use crate::objects::ObjectCatalog;
use crate::store::{ElementId, WorldStore};
use crate::types::{CompanyId, IndustryId, SmallZ, TilePos, WorldPos};

const SURVEY_RADIUS: i32 = 5;

fn survey_area(store: &WorldStore, centre: TilePos) -> impl Iterator<Item = TilePos> + '_ {
    (-SURVEY_RADIUS..=SURVEY_RADIUS)
        .flat_map(move |dy| {
            (-SURVEY_RADIUS..=SURVEY_RADIUS).map(move |dx| centre + TilePos::new(dx, dy))
        })
        .filter(move |&pos| store.in_bounds(pos))
}

/// The company owning an element, or `CompanyId::NULL` for unowned kinds.
/// A signal belongs to whoever owns the track under it.
pub fn tile_owner(store: &WorldStore, id: ElementId) -> CompanyId {
    let Some(el) = store.element(id) else {
        return CompanyId::NULL;
    };
    match el.view() {
        ElementRef::Track(track) => track.owner(),
        ElementRef::Road(road) => road.owner(),
        ElementRef::Station(station) => station.owner(),
        ElementRef::Signal(_) => store
            .previous(id)
            .and_then(|prev| prev.as_kind::<TrackElement>())
            .map_or(CompanyId::NULL, |track| track.owner()),
        _ => CompanyId::NULL,
    }
}

/// Highest point minus lowest point over the 11x11 area, in world height
/// units. A sloped tile's high point counts one step above its base, two for
/// a double-height slope.
pub fn mountain_height(store: &WorldStore, centre: TilePos) -> i32 {
    let mut lowest = i32::MAX;
    let mut highest = 0;
    for pos in survey_area(store, centre) {
        let Some(surface) = store.get(pos).surface() else {
            continue;
        };
        let mut height = surface.base_height();
        lowest = lowest.min(height);
        if surface.slope() != 0 {
            height += 16;
            if surface.is_slope_double_height() {
                height += 16;
            }
        }
        highest = highest.max(height);
    }
    if lowest == i32::MAX { 0 } else { highest - lowest }
}

pub fn count_surrounding_water_tiles(store: &WorldStore, centre: TilePos) -> u16 {
    survey_area(store, centre)
        .filter(|&pos| store.get(pos).surface().is_some_and(|s| s.water() > 0))
        .count() as u16
}

/// Non-ghost trees in the area.
pub fn count_surrounding_trees(store: &WorldStore, centre: TilePos) -> u16 {
    survey_area(store, centre)
        .map(|pos| {
            store
                .get(pos)
                .iter()
                .filter(|el| el.as_kind::<TreeElement>().is_some() && !el.is_ghost())
                .count()
        })
        .sum::<usize>() as u16
}

/// Dry tiles whose terrain is a desert land type. An oasis is not desert.
pub fn count_surrounding_desert_tiles(
    store: &WorldStore,
    objects: &ObjectCatalog,
    centre: TilePos,
) -> u16 {
    survey_area(store, centre)
        .filter(|&pos| {
            store.get(pos).surface().is_some_and(|s| {
                s.water() == 0 && objects.land(s.terrain()).is_some_and(|land| land.is_desert)
            })
        })
        .count() as u16
}

/// Flat surfaces get `clear_z == base_z`.
pub fn reset_surface_clearance(store: &mut WorldStore) {
    for y in 0..store.rows() {
        for x in 0..store.columns() {
            if let Some(surface) = store.surface_mut(TilePos::new(x, y)) {
                if surface.slope() == 0 {
                    let base_z = surface.base_z();
                    surface.set_clear_z(base_z);
                }
            }
        }
    }
}

/// Remove every wall on the tile that overlaps the band from `base_z` up to
/// 12 small steps above it. Returns how many were removed.
pub fn remove_all_walls_on_tile(
    store: &mut WorldStore,
    ctx: &mut CommandContext,
    pos: TilePos,
    base_z: SmallZ,
) -> usize {
    let doomed: Vec<usize> = store
        .get(pos)
        .iter()
        .enumerate()
        .filter(|(_, el)| matches!(el.view(), ElementRef::Wall(_)))
        .filter(|(_, el)| base_z < el.clear_z() && u16::from(base_z) + 12 >= u16::from(el.base_z()))
        .map(|(i, _)| i)
        .collect();

    let mut removed = 0;
    // Back to front so earlier indices stay put.
    for &i in doomed.iter().rev() {
        let Some(id) = store.get(pos).id(i) else {
            continue;
        };
        match store.remove_element(id) {
            Ok(()) => removed += 1,
            Err(err) => log::warn!("could not remove wall at {pos}: {err}"),
        }
    }
    if removed > 0 {
        ctx.emit(WorldEvent::WallsRemoved { pos, count: removed });
    }
    removed
}

/// Detach the surface at `pos` from any industry's fields.
pub fn remove_surface_industry(store: &mut WorldStore, ctx: &mut CommandContext, pos: WorldPos) {
    let Some(surface) = store.surface_mut(pos.tile()) else {
        return;
    };
    if !surface.is_industrial() {
        return;
    }
    let industry = surface.industry_id();
    surface.set_industrial(false);
    surface.set_growth_stage(0);
    surface.set_industry(IndustryId(0));
    ctx.emit(WorldEvent::SurfaceIndustryRemoved { pos, industry });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::element::{ElementKind, RoadElement, SignalElement, slope};

    fn store() -> WorldStore {
        WorldStore::new(&WorldConfig::small(16, 16))
    }

    #[test]
    fn owner_of_track_road_and_signal() {
        let mut s = store();
        let pos = TilePos::new(3, 3);
        let track = s.insert_element(ElementKind::Track, pos, 4, 0xF).unwrap();
        s.element_mut(track)
            .unwrap()
            .as_kind_mut::<TrackElement>()
            .unwrap()
            .set_owner(CompanyId(2));
        let signal = s.insert_element(ElementKind::Signal, pos, 4, 0xF).unwrap();
        // Ids go stale after the second insertion.
        let track = s.get(pos).id(1).unwrap();
        assert_eq!(tile_owner(&s, track), CompanyId(2));
        assert_eq!(tile_owner(&s, signal), CompanyId(2));
        assert!(s.element(signal).unwrap().as_kind::<SignalElement>().is_some());

        let road = s.insert_element(ElementKind::Road, TilePos::new(5, 5), 4, 0xF).unwrap();
        s.element_mut(road)
            .unwrap()
            .as_kind_mut::<RoadElement>()
            .unwrap()
            .set_owner(CompanyId(7));
        assert_eq!(tile_owner(&s, road), CompanyId(7));

        let surface = s.get(TilePos::new(0, 0)).id(0).unwrap();
        assert_eq!(tile_owner(&s, surface), CompanyId::NULL);
    }

    #[test]
    fn mountain_height_spans_lowest_to_highest() {
        let mut s = store();
        assert_eq!(mountain_height(&s, TilePos::new(8, 8)), 0);
        let peak = s.surface_mut(TilePos::new(10, 8)).unwrap();
        peak.set_base_z(20);
        peak.set_slope(slope::CORNER_DOWN_NORTH | slope::DOUBLE_HEIGHT);
        // (20 - 4) * 4 + 32
        assert_eq!(mountain_height(&s, TilePos::new(8, 8)), 96);
        // Out of reach from the far corner.
        assert_eq!(mountain_height(&s, TilePos::new(2, 2)), 0);
    }

    #[test]
    fn counts_skip_positions_off_the_map() {
        let mut s = store();
        s.surface_mut(TilePos::new(0, 0)).unwrap().set_water(2);
        s.surface_mut(TilePos::new(1, 0)).unwrap().set_water(2);
        s.surface_mut(TilePos::new(9, 9)).unwrap().set_water(2);
        assert_eq!(count_surrounding_water_tiles(&s, TilePos::new(0, 0)), 2);
        assert_eq!(count_surrounding_water_tiles(&s, TilePos::new(5, 5)), 3);
    }

    #[test]
    fn ghost_trees_are_not_counted() {
        let mut s = store();
        let pos = TilePos::new(4, 4);
        s.insert_element(ElementKind::Tree, pos, 4, 0x1).unwrap();
        let ghost = s.insert_element(ElementKind::Tree, pos, 4, 0x2).unwrap();
        s.element_mut(ghost).unwrap().set_ghost(true);
        s.insert_element(ElementKind::Tree, TilePos::new(6, 6), 4, 0x1).unwrap();
        assert_eq!(count_surrounding_trees(&s, pos), 2);
    }

    #[test]
    fn desert_needs_dry_desert_terrain() {
        let mut s = store();
        let objects = ObjectCatalog::sample();
        s.surface_mut(TilePos::new(4, 4)).unwrap().set_terrain(1);
        let oasis = s.surface_mut(TilePos::new(5, 4)).unwrap();
        oasis.set_terrain(1);
        oasis.set_water(1);
        assert_eq!(count_surrounding_desert_tiles(&s, &objects, TilePos::new(4, 4)), 1);
    }

    #[test]
    fn reset_clearance_only_touches_flat_tiles() {
        let mut s = store();
        let flat = s.surface_mut(TilePos::new(1, 1)).unwrap();
        flat.set_clear_z(30);
        let sloped = s.surface_mut(TilePos::new(2, 1)).unwrap();
        sloped.set_slope(slope::CORNER_UP_EAST);
        sloped.set_clear_z(8);
        reset_surface_clearance(&mut s);
        assert_eq!(s.get(TilePos::new(1, 1)).surface().unwrap().clear_z(), 4);
        assert_eq!(s.get(TilePos::new(2, 1)).surface().unwrap().clear_z(), 8);
    }

    #[test]
    fn walls_in_band_are_removed() {
        let mut s = store();
        let pos = TilePos::new(3, 3);
        for base_z in [4, 12, 40] {
            let id = s.insert_element(ElementKind::Wall, pos, base_z, 0x1).unwrap();
            s.element_mut(id).unwrap().set_clear_z(base_z + 8);
        }
        let mut ctx = CommandContext::apply(CompanyId(0));
        assert_eq!(remove_all_walls_on_tile(&mut s, &mut ctx, pos, 4), 2);
        let tile = s.get(pos);
        assert_eq!(tile.len(), 2);
        assert_eq!(tile.get(1).unwrap().base_z(), 40);
        assert_eq!(ctx.events, vec![WorldEvent::WallsRemoved { pos, count: 2 }]);
        s.validate().unwrap();
    }

    #[test]
    fn surface_industry_is_cleared_once() {
        let mut s = store();
        let pos = WorldPos::new(64, 64);
        let surface = s.surface_mut(pos.tile()).unwrap();
        surface.set_industrial(true);
        surface.set_industry(IndustryId(3));
        surface.set_growth_stage(5);
        let mut ctx = CommandContext::apply(CompanyId(0));
        remove_surface_industry(&mut s, &mut ctx, pos);
        remove_surface_industry(&mut s, &mut ctx, pos);
        let surface = s.get(pos.tile()).surface().unwrap();
        assert!(!surface.is_industrial());
        assert_eq!(surface.growth_stage(), 0);
        assert_eq!(surface.industry_id(), IndustryId(0));
        assert_eq!(
            ctx.events,
            vec![WorldEvent::SurfaceIndustryRemoved { pos, industry: IndustryId(3) }]
        );
    }
}
