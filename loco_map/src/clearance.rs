// Construction clearance: can a volume of space be occupied?
//
// A candidate volume is a tile position, a vertical range `base_z..clear_z`
// (small z units), and a `QuarterTile` footprint. `can_construct_at` and the
// `apply_clear_*` variants walk the tile's run bottom to top and test the
// volume against each element:
//
// - The surface collides only where the footprint overlaps a raised corner
//   without sitting fully above it. Along the way the check records whether
//   the volume is underground or under water, and volumes straddling the
//   water line need the clear function's consent.
// - Other elements collide on z-overlap plus a shared quadrant. Ghosts never
//   collide. In any-height mode trees, buildings, industries, airports and
//   docks collide regardless of z.
// - Elements claimed by an AI company's plan go through the AI contention
//   check, which lets a human player override the claim.
//
// On a collision the optional clear function decides what happens. It may
// report the obstacle as harmless, refuse (with or without having set error
// text), or remove it. After a removal the run has changed, so the scan
// restarts from the bottom of the tile; if the removed element was the last
// in the run there is nothing left to test and the scan succeeds at once.
// The walk is a small state machine over `ScanStep`.
//
// `clear_with_default_collision` / `clear_without_default_collision` are the
// standard clear functions: they price and (when applying) remove trees and
// whole buildings, deduplicating multi-tile buildings through
// `RemovedBuildings` so each is charged once per command.
//
// See also: `surface.rs` for corner heights, `command.rs` for the context
// the checks read flags from and write errors to, `terraform.rs` which uses
// these checks for land and water edits.

use crate::command::{CommandContext, CommandFlags, ElementPositionFlags, ErrorText};
use crate::element::{
    BuildingElement, ElementKind, ElementRef, StationType, SurfaceElement, TileElement,
};
use crate::event::WorldEvent;
use crate::quarter_tile::QuarterTile;
use crate::store::ElementId;
use crate::surface::{Corner, surface_corner_heights};
use crate::survey::tile_owner;
use crate::types::{
    CompanyId, Currency, MICRO_TO_SMALL_Z_STEP, MULTI_TILE_OFFSETS, Pos3, SMALL_Z_STEP, SmallZ,
    TILE_SIZE, TilePos, WorldPos,
};
use crate::world::World;
use smallvec::SmallVec;

/// Outcome of a clear function, and of each per-element check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearFuncResult {
    NoCollision,
    /// Blocked; the walk sets the generic "X in the way" text.
    Collision,
    /// Blocked; error text already set.
    CollisionErrorSet,
    /// The obstacle was removed; rescan the tile.
    CollisionRemoved,
    /// The obstacle was removed and nothing remains above it.
    AllCollisionsRemoved,
}

impl ClearFuncResult {
    pub fn is_collision(self) -> bool {
        matches!(self, Self::Collision | Self::CollisionErrorSet)
    }
}

/// A caller-supplied obstacle policy.
pub type ClearFunction<'a> =
    dyn FnMut(&mut World, &mut CommandContext, ElementId) -> ClearFuncResult + 'a;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildingCollisionType {
    Standard,
    /// Trees, buildings, industries, airports and docks collide at any height.
    AnyHeight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanStep {
    Continue,
    Restart,
    Fail,
    Succeed,
}

/// Origins (x, y, z) of buildings already demolished by the current
/// command, so multi-tile buildings are only charged once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovedBuildings(SmallVec<[Pos3; 8]>);

impl RemovedBuildings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, origin: &Pos3) -> bool {
        self.0.binary_search(origin).is_ok()
    }

    /// Returns false if already present.
    pub fn insert(&mut self, origin: Pos3) -> bool {
        match self.0.binary_search(&origin) {
            Ok(_) => false,
            Err(at) => {
                self.0.insert(at, origin);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pos3> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Positions inside the one-tile border of the map.
pub fn drawable_coords(world: &World, pos: WorldPos) -> bool {
    let width = world.store.columns() * TILE_SIZE;
    let height = world.store.rows() * TILE_SIZE;
    pos.x >= TILE_SIZE
        && pos.y >= TILE_SIZE
        && pos.x < width - TILE_SIZE
        && pos.y < height - TILE_SIZE
}

/// Pure query: does anything block the volume?
pub fn can_construct_at(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    base_z: SmallZ,
    clear_z: SmallZ,
    qt: QuarterTile,
) -> bool {
    can_construct_at_with_clear(
        world,
        ctx,
        pos,
        base_z,
        clear_z,
        qt,
        BuildingCollisionType::Standard,
        None,
    )
}

pub fn apply_clear_at_standard_height(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    base_z: SmallZ,
    clear_z: SmallZ,
    qt: QuarterTile,
    clear_fn: Option<&mut ClearFunction<'_>>,
) -> bool {
    can_construct_at_with_clear(
        world,
        ctx,
        pos,
        base_z,
        clear_z,
        qt,
        BuildingCollisionType::Standard,
        clear_fn,
    )
}

pub fn apply_clear_at_all_heights(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    base_z: SmallZ,
    clear_z: SmallZ,
    qt: QuarterTile,
    clear_fn: Option<&mut ClearFunction<'_>>,
) -> bool {
    can_construct_at_with_clear(
        world,
        ctx,
        pos,
        base_z,
        clear_z,
        qt,
        BuildingCollisionType::AnyHeight,
        clear_fn,
    )
}

#[allow(clippy::too_many_arguments)]
fn can_construct_at_with_clear(
    world: &mut World,
    ctx: &mut CommandContext,
    pos: WorldPos,
    base_z: SmallZ,
    clear_z: SmallZ,
    qt: QuarterTile,
    collision_type: BuildingCollisionType,
    mut clear_fn: Option<&mut ClearFunction<'_>>,
) -> bool {
    ctx.position_flags = ElementPositionFlags::ABOVE_GROUND;
    if !drawable_coords(world, pos) {
        ctx.set_error(ErrorText::OffEdgeOfMap);
        return false;
    }
    let tile_pos = pos.tile();
    let volume = Volume { base_z, clear_z, qt };

    'scan: loop {
        let mut i = 0;
        loop {
            let tile = world.store.get(tile_pos);
            let (Some(id), Some(&el)) = (tile.id(i), tile.get(i)) else {
                return true;
            };
            let res = match el.as_kind::<SurfaceElement>() {
                Some(surface) => check_surface_element(
                    world,
                    ctx,
                    volume,
                    clear_fn.as_deref_mut(),
                    tile_pos,
                    id,
                    surface,
                ),
                None => check_non_surface_element(
                    world,
                    ctx,
                    volume,
                    collision_type,
                    clear_fn.as_deref_mut(),
                    tile_pos,
                    id,
                    &el,
                ),
            };
            match scan_step(world, ctx, res, &el) {
                ScanStep::Continue => i += 1,
                ScanStep::Restart => continue 'scan,
                ScanStep::Fail => return false,
                ScanStep::Succeed => return true,
            }
        }
    }
}

fn scan_step(
    world: &World,
    ctx: &mut CommandContext,
    res: ClearFuncResult,
    el: &TileElement,
) -> ScanStep {
    match res {
        ClearFuncResult::NoCollision => ScanStep::Continue,
        ClearFuncResult::AllCollisionsRemoved => ScanStep::Succeed,
        ClearFuncResult::Collision => {
            set_collision_error_message(world, ctx, el);
            ScanStep::Fail
        }
        ClearFuncResult::CollisionRemoved => ScanStep::Restart,
        ClearFuncResult::CollisionErrorSet => ScanStep::Fail,
    }
}

#[derive(Clone, Copy, Debug)]
struct Volume {
    base_z: SmallZ,
    clear_z: SmallZ,
    qt: QuarterTile,
}

fn call_clear_function(
    world: &mut World,
    ctx: &mut CommandContext,
    clear_fn: Option<&mut ClearFunction<'_>>,
    id: ElementId,
) -> ClearFuncResult {
    match clear_fn {
        Some(f) => f(world, ctx, id),
        None => ClearFuncResult::Collision,
    }
}

// ---------------------------------------------------------------------------
// Per-element checks
// ---------------------------------------------------------------------------

fn check_surface_element(
    world: &mut World,
    ctx: &mut CommandContext,
    volume: Volume,
    mut clear_fn: Option<&mut ClearFunction<'_>>,
    tile_pos: TilePos,
    id: ElementId,
    surface: &SurfaceElement,
) -> ClearFuncResult {
    let Volume { base_z, clear_z, qt } = volume;
    if surface.is_ai_allocated() {
        let res = ai_company_about_to_build_check(world, ctx, tile_pos, id);
        if res != ClearFuncResult::NoCollision {
            return res;
        }
    }

    let water_z = u16::from(surface.water()) * u16::from(MICRO_TO_SMALL_Z_STEP);
    let (base, clear) = (u16::from(base_z), u16::from(clear_z));
    if water_z != 0 && clear_z > surface.clear_z() && base < water_z + u16::from(SMALL_Z_STEP) {
        ctx.position_flags.insert(ElementPositionFlags::PARTIALLY_UNDERWATER);
        if base < water_z {
            ctx.position_flags.insert(ElementPositionFlags::UNDERWATER);
            if clear > water_z {
                match clear_fn.as_deref_mut() {
                    Some(f) => {
                        let res = f(world, ctx, id);
                        if res.is_collision() {
                            if res == ClearFuncResult::Collision {
                                ctx.set_error(ErrorText::CannotBuildPartlyAboveBelowWater);
                            }
                            return ClearFuncResult::CollisionErrorSet;
                        }
                    }
                    None => {
                        ctx.set_error(ErrorText::CannotBuildPartlyAboveBelowWater);
                        return ClearFuncResult::CollisionErrorSet;
                    }
                }
            }
        }
    }

    if qt.z_quarter_occupied() == 0xF {
        return ClearFuncResult::NoCollision;
    }

    if clear_z <= surface.base_z() {
        ctx.position_flags.insert(ElementPositionFlags::UNDERGROUND);
        ctx.position_flags.remove(ElementPositionFlags::ABOVE_GROUND);
        return ClearFuncResult::NoCollision;
    }

    let corner_z = surface_corner_heights(surface);
    let base_quarters = qt.base_quarter_occupied();
    let z_quarters = qt.z_quarter_occupied();
    let double_height = base + 2 * u16::from(SMALL_Z_STEP);
    let clears_corner = |corner: Corner| {
        let z = corner_z[corner as usize];
        let bit = corner.bit();
        base_quarters & bit == 0
            || ((z_quarters & bit != 0 || base_z >= z) && double_height >= u16::from(z))
    };
    if Corner::ALL.into_iter().all(clears_corner) {
        return ClearFuncResult::NoCollision;
    }
    call_clear_function(world, ctx, clear_fn, id)
}

#[allow(clippy::too_many_arguments)]
fn check_non_surface_element(
    world: &mut World,
    ctx: &mut CommandContext,
    volume: Volume,
    collision_type: BuildingCollisionType,
    mut clear_fn: Option<&mut ClearFunction<'_>>,
    tile_pos: TilePos,
    id: ElementId,
    el: &TileElement,
) -> ClearFuncResult {
    let Volume { base_z, clear_z, qt } = volume;
    if collision_type == BuildingCollisionType::AnyHeight {
        let always_collides = match el.view() {
            ElementRef::Tree(_) | ElementRef::Building(_) | ElementRef::Industry(_) => true,
            ElementRef::Station(station) => matches!(
                station.station_type(),
                StationType::Airport | StationType::Docks
            ),
            _ => false,
        };
        if always_collides {
            return call_clear_function(world, ctx, clear_fn, id);
        }
    }
    if base_z >= el.clear_z() || clear_z <= el.base_z() {
        return ClearFuncResult::NoCollision;
    }
    if el.is_ghost() {
        return ClearFuncResult::NoCollision;
    }
    if el.occupied_quarter() & qt.base_quarter_occupied() == 0 {
        return ClearFuncResult::NoCollision;
    }
    if !el.is_ai_allocated() {
        return call_clear_function(world, ctx, clear_fn, id);
    }
    if let Some(f) = clear_fn.as_deref_mut() {
        let res = f(world, ctx, id);
        if !res.is_collision() {
            return res;
        }
    }
    ai_company_about_to_build_check(world, ctx, tile_pos, id)
}

// ---------------------------------------------------------------------------
// AI contention
// ---------------------------------------------------------------------------

/// Decide whether the updating company may build over an AI-claimed element.
/// For a surface, the claim is found on the first AI-allocated owned element
/// above it.
pub fn ai_company_about_to_build_check(
    world: &mut World,
    ctx: &mut CommandContext,
    tile_pos: TilePos,
    id: ElementId,
) -> ClearFuncResult {
    let Some(el) = world.store.element(id).copied() else {
        return ClearFuncResult::NoCollision;
    };

    if el.kind() != ElementKind::Surface {
        let owner = tile_owner(&world.store, id);
        if owner == CompanyId::NULL {
            return ClearFuncResult::NoCollision;
        }
        return resolve_contention(world, ctx, owner);
    }

    let claimant = {
        let tile = world.store.get(tile_pos);
        let from = tile.index_of(id).map_or(tile.len(), |i| i + 1);
        (from..tile.len())
            .filter(|&i| tile.get(i).is_some_and(|el| el.is_ai_allocated()))
            .filter_map(|i| tile.id(i))
            .map(|above| tile_owner(&world.store, above))
            .find(|&owner| owner != CompanyId::NULL)
    };
    match claimant {
        Some(owner) => resolve_contention(world, ctx, owner),
        None => {
            ctx.set_error(ErrorText::AnotherCompanyAboutToBuildHere);
            ClearFuncResult::CollisionErrorSet
        }
    }
}

fn resolve_contention(
    world: &mut World,
    ctx: &mut CommandContext,
    owner: CompanyId,
) -> ClearFuncResult {
    let updating = ctx.updating_company;
    if updating == CompanyId::NEUTRAL || !world.companies.is_player(updating) {
        ctx.set_error(ErrorText::AnotherCompanyAboutToBuildHere);
        return ClearFuncResult::CollisionErrorSet;
    }
    if owner == updating || world.companies.is_player(owner) {
        return ClearFuncResult::Collision;
    }
    let company = world.companies.companies.entry(owner).or_default();
    if company.ai_plan_locked {
        ctx.set_error(ErrorText::AnotherCompanyAboutToBuildHere);
        return ClearFuncResult::CollisionErrorSet;
    }
    company.ai_plan_preempted = true;
    log::debug!("company {} pre-empts AI plan of company {}", updating.0, owner.0);
    ClearFuncResult::NoCollision
}

// ---------------------------------------------------------------------------
// Error text
// ---------------------------------------------------------------------------

/// Set the "X in the way" error text for a blocking element.
pub fn set_collision_error_message(world: &World, ctx: &mut CommandContext, el: &TileElement) {
    let objects = &world.objects;
    let text = match el.view() {
        ElementRef::Surface(_) => ErrorText::RaiseOrLowerLandFirst,
        ElementRef::Track(track) => {
            in_the_way(objects.track(track.track_object_id()).map(|o| &o.name))
        }
        ElementRef::Road(road) => in_the_way(objects.road(road.road_object_id()).map(|o| &o.name)),
        ElementRef::Tree(tree) => in_the_way(objects.tree(tree.object_id()).map(|o| &o.name)),
        ElementRef::Building(building) => {
            in_the_way(objects.building(building.object_id()).map(|o| &o.name))
        }
        ElementRef::Station(station) => {
            let name = match station.station_type() {
                StationType::TrainStation | StationType::RoadStation => "Station",
                StationType::Airport => "Airport",
                StationType::Docks => "Ship port",
            };
            ErrorText::InTheWay(name.to_string())
        }
        ElementRef::Signal(_) => ErrorText::InTheWay("Signal".to_string()),
        ElementRef::Wall(_) => ErrorText::ObjectInTheWay,
        ElementRef::Industry(industry) => match objects.industry(industry.industry_id()) {
            Some(info) => ErrorText::InTheWay(format!("{} ({})", info.name, info.town)),
            None => ErrorText::ObjectInTheWay,
        },
    };
    ctx.set_error(text);
}

fn in_the_way(name: Option<&String>) -> ErrorText {
    name.map_or(ErrorText::ObjectInTheWay, |n| ErrorText::InTheWay(n.clone()))
}

// ---------------------------------------------------------------------------
// Default clear functions
// ---------------------------------------------------------------------------

/// Remove trees and buildings; every other obstacle collides.
pub fn clear_with_default_collision(
    world: &mut World,
    ctx: &mut CommandContext,
    id: ElementId,
    pos: WorldPos,
    removed_buildings: &mut RemovedBuildings,
    cost: &mut Currency,
) -> ClearFuncResult {
    tile_clear_function(world, ctx, id, pos, removed_buildings, cost, true)
}

/// Remove trees and buildings; every other obstacle is ignored.
pub fn clear_without_default_collision(
    world: &mut World,
    ctx: &mut CommandContext,
    id: ElementId,
    pos: WorldPos,
    removed_buildings: &mut RemovedBuildings,
    cost: &mut Currency,
) -> ClearFuncResult {
    tile_clear_function(world, ctx, id, pos, removed_buildings, cost, false)
}

fn removal_result(world: &World) -> ClearFuncResult {
    if world.store.was_remove_on_last_element() {
        ClearFuncResult::AllCollisionsRemoved
    } else {
        ClearFuncResult::CollisionRemoved
    }
}

fn tile_clear_function(
    world: &mut World,
    ctx: &mut CommandContext,
    id: ElementId,
    pos: WorldPos,
    removed_buildings: &mut RemovedBuildings,
    cost: &mut Currency,
    default_collision: bool,
) -> ClearFuncResult {
    let Some(el) = world.store.element(id).copied() else {
        return ClearFuncResult::NoCollision;
    };
    let applying = ctx.flags.is_apply() && !ctx.flags.is_ghost();
    match el.view() {
        ElementRef::Surface(_) => ClearFuncResult::NoCollision,
        ElementRef::Tree(tree) => {
            let object_id = tree.object_id();
            if let Some(obj) = world.objects.tree(object_id) {
                *cost += world.economy.price(obj.clear_cost, 12);
            }
            if !applying {
                return ClearFuncResult::NoCollision;
            }
            world.store.watch_removal(id);
            if let Err(err) = world.store.remove_element(id) {
                log::error!("failed to remove tree at {pos}: {err}");
                ctx.set_error(ErrorText::CannotRemove("tree".to_string()));
                return ClearFuncResult::CollisionErrorSet;
            }
            ctx.emit(WorldEvent::TreeRemoved { pos, object_id });
            removal_result(world)
        }
        ElementRef::Building(building) => {
            let object = world.objects.building(building.object_id());
            if object.is_some_and(|o| o.is_headquarters) {
                return ClearFuncResult::Collision;
            }
            let offset = MULTI_TILE_OFFSETS[usize::from(building.multi_tile_index())];
            let origin = Pos3::from_world(pos - offset, building.base_height());

            if removed_buildings.contains(&origin) {
                // Already demolished and charged by this command. A piece that
                // is still standing goes without a second charge.
                if !applying {
                    return ClearFuncResult::NoCollision;
                }
                world.store.watch_removal(id);
                return match world.store.remove_element(id) {
                    Ok(()) => removal_result(world),
                    Err(err) => {
                        log::error!("failed to remove building piece at {pos}: {err}");
                        ClearFuncResult::NoCollision
                    }
                };
            }
            removed_buildings.insert(origin);

            let mut flags = ctx.flags;
            if flags.is_apply() || removed_buildings.len() != 1 {
                flags |= CommandFlags::FLAG_7;
            }
            if flags.is_ghost() {
                flags.remove(CommandFlags::GHOST | CommandFlags::APPLY);
            }
            world.store.watch_removal(id);
            let Some(building_cost) = remove_building(world, ctx, origin, flags) else {
                return ClearFuncResult::CollisionErrorSet;
            };
            *cost += building_cost;
            if !applying {
                return ClearFuncResult::NoCollision;
            }
            removal_result(world)
        }
        _ if default_collision => ClearFuncResult::Collision,
        _ => ClearFuncResult::NoCollision,
    }
}

/// Demolish a whole building from its origin: every piece is removed when
/// `flags` applies. Returns the demolition cost, or `None` with error text
/// set when the building can't be removed.
pub fn remove_building(
    world: &mut World,
    ctx: &mut CommandContext,
    origin: Pos3,
    flags: CommandFlags,
) -> Option<Currency> {
    let base_z = (origin.z / i32::from(SMALL_Z_STEP)) as SmallZ;
    let origin_tile = origin.world().tile();
    let Some(origin_piece) = find_building_piece(world, origin_tile, base_z, 0, None)
        .and_then(|id| world.store.element(id))
        .and_then(|el| el.as_kind::<BuildingElement>().copied())
    else {
        log::warn!("no building origin at {origin_tile} z {base_z}");
        ctx.set_error(ErrorText::CannotRemove("building".to_string()));
        return None;
    };
    let object_id = origin_piece.object_id();
    let object = world.objects.building(object_id);
    if let Some(obj) = object.filter(|o| o.is_headquarters) {
        ctx.set_error(ErrorText::CannotRemove(obj.name.clone()));
        return None;
    }
    let pieces = if object.is_some_and(|o| o.is_large) { 4 } else { 1 };
    let cost = object.map_or(0, |o| world.economy.price(o.clear_cost, 8));

    if flags.is_apply() {
        for (index, offset) in MULTI_TILE_OFFSETS.iter().enumerate().take(pieces) {
            let piece_tile = (origin.world() + *offset).tile();
            let Some(id) =
                find_building_piece(world, piece_tile, base_z, index as u8, Some(object_id))
            else {
                continue;
            };
            if let Err(err) = world.store.remove_element(id) {
                log::error!("failed to remove building piece at {piece_tile}: {err}");
            }
        }
        ctx.emit(WorldEvent::BuildingDemolished {
            origin,
            object_id,
            constructed: origin_piece.is_constructed(),
            nested: flags.contains(CommandFlags::FLAG_7),
        });
    }
    Some(cost)
}

fn find_building_piece(
    world: &World,
    tile_pos: TilePos,
    base_z: SmallZ,
    multi_tile_index: u8,
    object_id: Option<u8>,
) -> Option<ElementId> {
    let tile = world.store.get(tile_pos);
    let i = tile.iter().position(|el| {
        el.base_z() == base_z
            && el.as_kind::<BuildingElement>().is_some_and(|b| {
                b.multi_tile_index() == multi_tile_index
                    && object_id.is_none_or(|id| b.object_id() == id)
            })
    })?;
    tile.id(i)
}
