// loco_map: tile element storage and construction clearance for a tile map.
//
// This crate owns the map's spatial truth: one run of 8-byte elements per
// tile (surface first, then tracks, roads, buildings, trees and so on in
// ascending height), the arena they live in, and the rules deciding whether
// new construction fits. It knows nothing about rendering, vehicles or the
// UI; towns and companies appear only through the collaborator data in
// `World` and the events it hands back.
//
// Module overview:
// - `types.rs`:        Coordinates, height units, company/industry/station ids.
// - `quarter_tile.rs`: QuarterTile, 4-bit base + 4-bit z occupancy masks.
// - `element.rs`:      TileElement (the 8-byte record) and its nine typed views.
// - `store.rs`:        WorldStore: arena, tile index, insert/remove, defrag, load/dump.
// - `surface.rs`:      Slope geometry and height queries.
// - `clearance.rs`:    can_construct_at / apply_clear_* and the default clear functions.
// - `survey.rs`:       Area surveys, element owners, wall and industry cleanups.
// - `terraform.rs`:    Land and water height edits.
// - `world.rs`:        World: store plus catalog, economy and company registry.
// - `command.rs`:      CommandContext, command flags, user-facing error text.
// - `event.rs`:        WorldEvents produced by demolitions and cleanups.
// - `config.rs`:       WorldConfig: map size, arena sizing, terraform bounds.
// - `objects.rs`:      ObjectCatalog: names and costs of trees, buildings, land, etc.
// - `economy.rs`:      Inflation-adjusted pricing.
// - `company.rs`:      Company registry as seen by AI contention.
//
// **Critical constraint: determinism.** Every operation is a pure function of
// the store's contents and its arguments. No `HashMap`, no system time, no
// OS entropy; `BTreeMap` for keyed collections. Defragmentation walks tiles
// in a fixed row-major order from a cursor stored in the `WorldStore`.

pub mod clearance;
pub mod command;
pub mod company;
pub mod config;
pub mod economy;
pub mod element;
pub mod event;
pub mod objects;
pub mod quarter_tile;
pub mod store;
pub mod surface;
pub mod survey;
pub mod terraform;
pub mod types;
pub mod world;
