// The tile element arena and its coordinate index.
//
// All elements for the whole map live in one flat `Vec<TileElement>` of
// fixed capacity. Each tile owns one contiguous "run" of slots, ordered by
// non-decreasing `base_z`, terminated by the element with the last flag. The
// coordinate index maps a tile (row-major, `y * columns + x`) to the first
// slot of its run. Slots past the high-water mark `end` are unused; slots
// below it with `base_z == FREE_SLOT_Z` are gaps left by removals and
// relocations, and belong to no run.
//
// Gaps are reclaimed two ways: `defragment_tile_periodic()` slides one run
// down into the gap in front of it per call (cheap, meant to run once per
// tick), and `reorganise()` repacks the whole arena in row-major order.
// `check_free_elements_and_reorganise()` escalates from the first to the
// second when a command needs headroom.
//
// Elements are addressed outside the store by `ElementId`, a slot index plus
// the store epoch at the time the id was issued. Every structural mutation
// bumps the epoch, so an id held across an insert, removal, or compaction
// resolves to `None` instead of silently naming whatever moved into its slot.
// `Tile` views borrow the store, so the borrow checker already stops them
// being held across mutations.
//
// See also: `element.rs` for the record layout, `world.rs` which owns the
// store alongside the object catalog and company data, `clearance.rs` which
// walks tiles and removes obstacles through this API.
//
// **Critical constraint: determinism.** Slot placement depends only on the
// sequence of operations, never on allocator or hash state, so two stores
// fed the same commands hold byte-identical arenas.

use crate::config::WorldConfig;
use crate::element::{ElementKind, FREE_SLOT_Z, SurfaceElement, TileElement};
use crate::types::{SmallZ, TilePos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from store mutation and loading.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("tile {0} is outside the map")]
    OutOfRange(TilePos),
    #[error("element arena exhausted ({capacity} slots)")]
    ArenaExhausted { capacity: usize },
    #[error("element handle is stale or names a free slot")]
    StaleHandle,
    #[error("cannot remove the only element on tile {0}")]
    OnlyElementOnTile(TilePos),
    #[error("record {slot} has unknown element kind {raw_kind}")]
    BadRecord { slot: usize, raw_kind: u8 },
    #[error("raw element data is {0} bytes, not a whole number of records")]
    BadLength(usize),
    #[error("{records} records do not fit an arena of {capacity} slots")]
    TooManyRecords { records: usize, capacity: usize },
    #[error("record data ends before every tile has a run")]
    Truncated,
    #[error("saved map is {rows}x{columns}, config expects {expected_rows}x{expected_columns}")]
    DimensionMismatch {
        rows: i32,
        columns: i32,
        expected_rows: i32,
        expected_columns: i32,
    },
    #[error("landscape data area full")]
    DataAreaFull,
}

/// Stable handle to an element: arena slot plus the store epoch it was
/// issued in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId {
    pub index: u32,
    pub epoch: u32,
}

/// Serde snapshot of a store: dimensions plus the row-major packed records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedWorld {
    pub rows: i32,
    pub columns: i32,
    pub records: Vec<TileElement>,
}

// ---------------------------------------------------------------------------
// Tile view
// ---------------------------------------------------------------------------

/// Non-owning view of one tile's run. A null tile (off the map, or a tile
/// with no run) has no elements.
#[derive(Clone, Copy, Debug)]
pub struct Tile<'a> {
    pub pos: TilePos,
    start: usize,
    elements: &'a [TileElement],
    epoch: u32,
}

impl<'a> Tile<'a> {
    fn null(pos: TilePos) -> Self {
        Self {
            pos,
            start: 0,
            elements: &[],
            epoch: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The run, bottom to top.
    pub fn elements(&self) -> &'a [TileElement] {
        self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'a, TileElement> {
        self.elements.iter()
    }

    pub fn get(&self, i: usize) -> Option<&'a TileElement> {
        self.elements.get(i)
    }

    /// Handle for the `i`th element of the run.
    pub fn id(&self, i: usize) -> Option<ElementId> {
        (i < self.elements.len()).then(|| ElementId {
            index: (self.start + i) as u32,
            epoch: self.epoch,
        })
    }

    /// Position of a handle within this run.
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        let slot = id.index as usize;
        (id.epoch == self.epoch && slot >= self.start && slot < self.start + self.len())
            .then(|| slot - self.start)
    }

    /// The first surface element.
    pub fn surface(&self) -> Option<&'a SurfaceElement> {
        self.elements.iter().find_map(|el| el.as_kind::<SurfaceElement>())
    }

    /// Index of the first surface element.
    pub fn surface_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|el| el.kind() == ElementKind::Surface)
    }
}

impl<'a> IntoIterator for Tile<'a> {
    type Item = &'a TileElement;
    type IntoIter = std::slice::Iter<'a, TileElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct WorldStore {
    elements: Vec<TileElement>,
    /// Run start per tile, row-major.
    index: Vec<Option<u32>>,
    /// Tile owning the run that starts at each slot. Only meaningful where
    /// `index[run_owner[slot]] == Some(slot)`; stale entries elsewhere are
    /// ignored.
    run_owner: Vec<u32>,
    rows: i32,
    columns: i32,
    /// High-water mark: one past the highest slot ever handed out and not
    /// yet reclaimed.
    end: usize,
    free_slack: usize,
    defrag_rounds: u32,
    epoch: u32,
    defrag_cursor: usize,
    watched_slot: Option<usize>,
    watched_removed_last: bool,
}

impl WorldStore {
    /// A store sized from `config`, initialised to flat land.
    pub fn new(config: &WorldConfig) -> Self {
        let capacity = config.capacity();
        let mut store = Self {
            elements: vec![TileElement::default(); capacity],
            index: vec![None; config.tile_count()],
            run_owner: vec![u32::MAX; capacity],
            rows: config.rows,
            columns: config.columns,
            end: 0,
            free_slack: config.free_slack,
            defrag_rounds: config.defrag_rounds,
            epoch: 0,
            defrag_cursor: 0,
            watched_slot: None,
            watched_removed_last: false,
        };
        store.initialise(config.sea_level_z, config.default_terrain);
        store
    }

    /// Load from persisted records (row-major runs, gaps allowed).
    pub fn from_records(config: &WorldConfig, records: &[TileElement]) -> Result<Self, StoreError> {
        let mut store = Self::new(config);
        store.load_records(records)?;
        Ok(store)
    }

    /// Load from the raw persisted byte layout.
    pub fn from_bytes(config: &WorldConfig, bytes: &[u8]) -> Result<Self, StoreError> {
        let records: &[TileElement] =
            bytemuck::try_cast_slice(bytes).map_err(|_| StoreError::BadLength(bytes.len()))?;
        Self::from_records(config, records)
    }

    pub fn restore(config: &WorldConfig, saved: &SavedWorld) -> Result<Self, StoreError> {
        if saved.rows != config.rows || saved.columns != config.columns {
            return Err(StoreError::DimensionMismatch {
                rows: saved.rows,
                columns: saved.columns,
                expected_rows: config.rows,
                expected_columns: config.columns,
            });
        }
        Self::from_records(config, &saved.records)
    }

    pub fn snapshot(&self) -> SavedWorld {
        SavedWorld {
            rows: self.rows,
            columns: self.columns,
            records: self.to_records(),
        }
    }

    fn load_records(&mut self, records: &[TileElement]) -> Result<(), StoreError> {
        if records.len() > self.elements.len() {
            return Err(StoreError::TooManyRecords {
                records: records.len(),
                capacity: self.elements.len(),
            });
        }
        for (slot, record) in records.iter().enumerate() {
            if !record.is_free() && record.kind_checked().is_none() {
                return Err(StoreError::BadRecord {
                    slot,
                    raw_kind: (record.to_bytes()[0] >> 2) & 0x0F,
                });
            }
        }
        self.elements.fill(TileElement::default());
        self.elements[..records.len()].copy_from_slice(records);
        self.update_tile_pointers()
    }

    /// Reset to one flat surface per tile at `base_z`.
    pub fn initialise(&mut self, base_z: SmallZ, terrain: u8) {
        self.elements.fill(TileElement::default());
        let mut surface = TileElement::new(ElementKind::Surface);
        surface.set_base_z(base_z);
        surface.set_clear_z(base_z);
        surface.set_last(true);
        if let Some(s) = surface.as_kind_mut::<SurfaceElement>() {
            s.set_terrain(terrain);
        }
        let tiles = self.index.len().min(self.elements.len());
        for tile in 0..tiles {
            self.elements[tile] = surface;
            self.index[tile] = Some(tile as u32);
            self.run_owner[tile] = tile as u32;
        }
        self.end = tiles;
        self.defrag_cursor = 0;
        self.watched_slot = None;
        self.bump_epoch();
    }

    // -----------------------------------------------------------------------
    // Dimensions and bookkeeping
    // -----------------------------------------------------------------------

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// High-water mark.
    pub fn elements_end(&self) -> usize {
        self.end
    }

    pub fn num_free_elements(&self) -> usize {
        self.elements.len() - self.end
    }

    /// Free slots below the high-water mark.
    pub fn num_gap_slots(&self) -> usize {
        self.elements[..self.end].iter().filter(|el| el.is_free()).count()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.columns && pos.y < self.rows
    }

    fn tile_index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.columns as usize + pos.x as usize)
    }

    fn tile_pos(&self, tile: usize) -> TilePos {
        let columns = self.columns as usize;
        TilePos::new((tile % columns) as i32, (tile / columns) as i32)
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Length of the run starting at `start`, bounded by the arena.
    fn run_len(&self, start: usize) -> usize {
        self.elements[start..self.end.max(start)]
            .iter()
            .position(|el| el.is_last())
            .map_or(self.end.saturating_sub(start), |i| i + 1)
    }

    /// Tile whose run starts at `slot`, if any.
    fn run_start_tile(&self, slot: usize) -> Option<usize> {
        let tile = *self.run_owner.get(slot)? as usize;
        (self.index.get(tile).copied().flatten() == Some(slot as u32)).then_some(tile)
    }

    fn mark_free(&mut self, slot: usize) {
        let el = &mut self.elements[slot];
        el.set_base_z(FREE_SLOT_Z);
        el.set_last(false);
        if slot + 1 == self.end {
            self.end -= 1;
        }
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// The tile at `pos`. Out-of-range positions log a warning and yield a
    /// null tile.
    pub fn get(&self, pos: TilePos) -> Tile<'_> {
        let Some(tile) = self.tile_index(pos) else {
            log::warn!("tile {pos} requested outside {}x{} map", self.columns, self.rows);
            return Tile::null(pos);
        };
        let Some(start) = self.index[tile] else {
            return Tile::null(pos);
        };
        let start = start as usize;
        let len = self.run_len(start);
        Tile {
            pos,
            start,
            elements: &self.elements[start..start + len],
            epoch: self.epoch,
        }
    }

    /// Resolve a handle. `None` if the epoch is stale or the slot is free.
    pub fn element(&self, id: ElementId) -> Option<&TileElement> {
        let slot = self.resolve(id)?;
        Some(&self.elements[slot])
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut TileElement> {
        let slot = self.resolve(id)?;
        Some(&mut self.elements[slot])
    }

    /// The element directly below `id` in its run.
    pub fn previous(&self, id: ElementId) -> Option<&TileElement> {
        let slot = self.resolve(id)?;
        if slot == 0 || self.run_start_tile(slot).is_some() {
            return None;
        }
        Some(&self.elements[slot - 1])
    }

    /// The tile's first surface element, for in-place edits.
    pub fn surface_mut(&mut self, pos: TilePos) -> Option<&mut SurfaceElement> {
        let id = {
            let tile = self.get(pos);
            tile.id(tile.surface_index()?)?
        };
        self.element_mut(id)?.as_kind_mut::<SurfaceElement>()
    }

    /// Restore `base_z` order within one run after an element's height was
    /// edited in place. The sort is stable, so equal heights keep their order.
    pub fn sort_tile(&mut self, pos: TilePos) {
        let Some(start) = self.tile_index(pos).and_then(|tile| self.index[tile]) else {
            return;
        };
        let start = start as usize;
        let len = self.run_len(start);
        let run = &mut self.elements[start..start + len];
        if run.windows(2).all(|w| w[0].base_z() <= w[1].base_z()) {
            return;
        }
        run.sort_by_key(|el| el.base_z());
        for (i, el) in run.iter_mut().enumerate() {
            el.set_last(i + 1 == len);
        }
        self.bump_epoch();
    }

    fn resolve(&self, id: ElementId) -> Option<usize> {
        let slot = id.index as usize;
        (id.epoch == self.epoch && slot < self.end && !self.elements[slot].is_free())
            .then_some(slot)
    }

    // -----------------------------------------------------------------------
    // Insert / remove
    // -----------------------------------------------------------------------

    /// Splice a new element into the run at `pos`, after every element whose
    /// `base_z` is not above the new one. `clear_z` starts equal to
    /// `base_z`; the caller fills in the rest.
    ///
    /// Callers run `check_free_elements_and_reorganise()` first in the same
    /// command; this only fails when the arena has no room at all.
    pub fn insert_element(
        &mut self,
        kind: ElementKind,
        pos: TilePos,
        base_z: SmallZ,
        occupied_quarters: u8,
    ) -> Result<ElementId, StoreError> {
        let tile = self.tile_index(pos).ok_or(StoreError::OutOfRange(pos))?;
        let (start, len) = match self.index[tile] {
            Some(start) => (start as usize, self.run_len(start as usize)),
            None => (self.end, 0),
        };
        let run_end = start + len;
        let offset = self.elements[start..run_end]
            .iter()
            .position(|el| el.base_z() > base_z)
            .unwrap_or(len);

        let mut new_el = TileElement::new(kind);
        new_el.set_base_z(base_z);
        new_el.set_clear_z(base_z);
        new_el.set_occupied_quarter(occupied_quarters);

        let grows_in_place = len > 0
            && run_end < self.elements.len()
            && (run_end == self.end || self.elements[run_end].is_free());

        let slot = if grows_in_place {
            self.elements.copy_within(start + offset..run_end, start + offset + 1);
            if run_end == self.end {
                self.end += 1;
            }
            start + offset
        } else {
            let new_start = self.end;
            if new_start + len + 1 > self.elements.len() {
                log::error!(
                    "no room to relocate {len}-element run of tile {pos} ({} slots)",
                    self.elements.len()
                );
                return Err(StoreError::ArenaExhausted {
                    capacity: self.elements.len(),
                });
            }
            self.elements.copy_within(start..start + offset, new_start);
            self.elements.copy_within(start + offset..run_end, new_start + offset + 1);
            for old in start..run_end {
                self.elements[old].set_base_z(FREE_SLOT_Z);
                self.elements[old].set_last(false);
            }
            self.end = new_start + len + 1;
            self.index[tile] = Some(new_start as u32);
            self.run_owner[new_start] = tile as u32;
            if len > 0 {
                log::debug!("relocated run of tile {pos} from slot {start} to {new_start}");
            }
            new_start + offset
        };

        let run_start = slot - offset;
        if offset == len {
            if len > 0 {
                self.elements[slot - 1].set_last(false);
            }
            new_el.set_last(true);
        }
        self.elements[slot] = new_el;
        debug_assert_eq!(self.index[tile], Some(run_start as u32));
        self.bump_epoch();
        Ok(ElementId {
            index: slot as u32,
            epoch: self.epoch,
        })
    }

    /// Remove one element. Elements above it slide down one slot.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), StoreError> {
        let slot = self.resolve(id).ok_or(StoreError::StaleHandle)?;
        let was_last = self.elements[slot].is_last();

        if self.watched_slot == Some(slot) && was_last {
            self.watched_slot = None;
            self.watched_removed_last = true;
        }

        if was_last {
            if let Some(tile) = self.run_start_tile(slot) {
                return Err(StoreError::OnlyElementOnTile(self.tile_pos(tile)));
            }
            self.elements[slot - 1].set_last(true);
            self.mark_free(slot);
        } else {
            let last = slot + self.run_len(slot) - 1;
            self.elements.copy_within(slot + 1..=last, slot);
            self.mark_free(last);
        }
        self.bump_epoch();
        Ok(())
    }

    /// Watch one element across subsequent removals. See
    /// `was_remove_on_last_element`.
    pub fn watch_removal(&mut self, id: ElementId) {
        self.watched_slot = self.resolve(id);
        self.watched_removed_last = false;
    }

    /// Whether the watched element was removed while it was the last of its
    /// run, meaning nothing is left above it to scan.
    pub fn was_remove_on_last_element(&self) -> bool {
        self.watched_removed_last
    }

    // -----------------------------------------------------------------------
    // Compaction
    // -----------------------------------------------------------------------

    /// Make sure a command has `free_slack` free slots, compacting as needed.
    pub fn check_free_elements_and_reorganise(&mut self) -> Result<(), StoreError> {
        if self.num_free_elements() >= self.free_slack {
            return Ok(());
        }
        for _ in 0..self.defrag_rounds {
            self.defragment_tile_periodic();
            if self.num_free_elements() >= self.free_slack {
                return Ok(());
            }
        }
        self.reorganise();
        if self.num_free_elements() >= self.free_slack {
            return Ok(());
        }
        log::error!(
            "landscape data area full: {} of {} slots in use",
            self.end,
            self.elements.len()
        );
        Err(StoreError::DataAreaFull)
    }

    /// Point the periodic defrag cursor back at slot 0. From there,
    /// rows × columns calls to `defragment_tile_periodic` leave no gaps.
    pub fn restart_defrag_pass(&mut self) {
        self.defrag_cursor = 0;
    }

    /// Slide the next run (from a rotating cursor) down over the free gap
    /// directly before it.
    pub fn defragment_tile_periodic(&mut self) {
        let Some((start, tile)) = self.next_run_from_cursor() else {
            self.defrag_cursor = 0;
            return;
        };
        let len = self.run_len(start);
        let mut gap_start = start;
        while gap_start > 0 && self.elements[gap_start - 1].is_free() {
            gap_start -= 1;
        }
        if gap_start < start {
            let run_end = start + len;
            self.elements.copy_within(start..run_end, gap_start);
            for vacated in (gap_start + len).max(start)..run_end {
                self.elements[vacated].set_base_z(FREE_SLOT_Z);
                self.elements[vacated].set_last(false);
            }
            self.index[tile] = Some(gap_start as u32);
            self.run_owner[gap_start] = tile as u32;
            if run_end == self.end {
                self.end = gap_start + len;
            }
            self.bump_epoch();
            log::debug!(
                "defragmented tile {}: run moved from slot {start} to {gap_start}",
                self.tile_pos(tile)
            );
        }
        self.defrag_cursor = gap_start + len;
    }

    /// First run start at or after the cursor, wrapping once to slot 0.
    fn next_run_from_cursor(&self) -> Option<(usize, usize)> {
        let from = if self.defrag_cursor < self.end { self.defrag_cursor } else { 0 };
        self.scan_for_run(from, self.end)
            .or_else(|| self.scan_for_run(0, from))
    }

    fn scan_for_run(&self, from: usize, to: usize) -> Option<(usize, usize)> {
        let mut slot = from;
        while slot < to {
            if self.elements[slot].is_free() {
                slot += 1;
            } else if let Some(tile) = self.run_start_tile(slot) {
                return Some((slot, tile));
            } else {
                slot += self.run_len(slot);
            }
        }
        None
    }

    /// Repack every run in row-major order with no gaps.
    pub fn reorganise(&mut self) {
        let records = self.to_records();
        self.elements.fill(TileElement::default());
        self.elements[..records.len()].copy_from_slice(&records);
        log::info!(
            "reorganised tile elements: {} in use, {} reclaimed",
            records.len(),
            self.end - records.len()
        );
        if let Err(err) = self.update_tile_pointers() {
            // Packed records always cover every tile.
            log::error!("index rebuild after reorganise failed: {err}");
        }
    }

    /// Rebuild the index by walking the arena in row-major tile order,
    /// skipping free slots.
    pub fn update_tile_pointers(&mut self) -> Result<(), StoreError> {
        self.index.fill(None);
        let mut slot = 0;
        for tile in 0..self.index.len() {
            while slot < self.elements.len() && self.elements[slot].is_free() {
                slot += 1;
            }
            if slot >= self.elements.len() {
                return Err(StoreError::Truncated);
            }
            self.index[tile] = Some(slot as u32);
            self.run_owner[slot] = tile as u32;
            let len = self.elements[slot..]
                .iter()
                .position(|el| el.is_last())
                .ok_or(StoreError::Truncated)?;
            slot += len + 1;
        }
        self.end = slot;
        self.defrag_cursor = 0;
        self.watched_slot = None;
        self.bump_epoch();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persisted layout
    // -----------------------------------------------------------------------

    /// Every run, row-major, packed with no gaps.
    pub fn to_records(&self) -> Vec<TileElement> {
        let mut records = Vec::with_capacity(self.end);
        for tile in 0..self.index.len() {
            let tile = self.get(self.tile_pos(tile));
            records.extend_from_slice(tile.elements());
        }
        records
    }

    /// Row-major packed records as raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_records()).to_vec()
    }

    /// Raw bytes of the live arena prefix, gaps included. This is a loadable
    /// layout only while runs sit in row-major order (after `reorganise()`,
    /// before any relocation); loading skips the gaps.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.elements[..self.end])
    }

    /// Check the structural invariants; returns a description of the first
    /// violation.
    pub fn validate(&self) -> Result<(), String> {
        let mut owned = vec![false; self.end];
        for tile in 0..self.index.len() {
            let pos = self.tile_pos(tile);
            let Some(start) = self.index[tile] else {
                return Err(format!("tile {pos} has no run"));
            };
            let start = start as usize;
            if start >= self.end {
                return Err(format!("tile {pos} run starts past the high-water mark"));
            }
            let run = self.get(pos);
            let mut prev_z = 0;
            for (i, el) in run.iter().enumerate() {
                if el.is_free() {
                    return Err(format!("tile {pos} run contains a free slot"));
                }
                if el.base_z() < prev_z {
                    return Err(format!("tile {pos} run is not sorted by base_z"));
                }
                if el.is_last() != (i + 1 == run.len()) {
                    return Err(format!("tile {pos} last flag misplaced at {i}"));
                }
                let slot = start + i;
                if std::mem::replace(&mut owned[slot], true) {
                    return Err(format!("slot {slot} shared by two runs"));
                }
                prev_z = el.base_z();
            }
        }
        if let Some(slot) = (0..self.end).find(|&s| !owned[s] && !self.elements[s].is_free()) {
            return Err(format!("slot {slot} is live but belongs to no run"));
        }
        Ok(())
    }
}
