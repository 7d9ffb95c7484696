// Randomized structural properties of the element store.
//
// Every test drives a `WorldStore` with a seeded ChaCha stream, so failures
// reproduce exactly. The properties are the ones the rest of the crate leans
// on: runs stay sorted with exactly one last flag, removal touches exactly
// one run, the persisted layout reloads to the same map, making room is
// idempotent, and periodic defragmentation converges.

use loco_map::config::WorldConfig;
use loco_map::element::ElementKind;
use loco_map::store::{SavedWorld, WorldStore};
use loco_map::surface::{Corner, get_height, surface_corner_height_at};
use loco_map::types::{TilePos, WorldPos};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ROWS: i32 = 10;
const COLUMNS: i32 = 14;

const KINDS: [ElementKind; 6] = [
    ElementKind::Track,
    ElementKind::Road,
    ElementKind::Tree,
    ElementKind::Wall,
    ElementKind::Building,
    ElementKind::Signal,
];

fn config() -> WorldConfig {
    WorldConfig {
        elements_per_tile: 8,
        free_slack: 16,
        ..WorldConfig::small(ROWS, COLUMNS)
    }
}

fn random_tile(rng: &mut ChaCha8Rng) -> TilePos {
    TilePos::new(rng.gen_range(0..COLUMNS), rng.gen_range(0..ROWS))
}

/// A store with `count` random elements inserted, making room first each
/// time the way a command would.
fn populated(seed: u64, count: usize) -> (WorldStore, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut store = WorldStore::new(&config());
    for _ in 0..count {
        store.check_free_elements_and_reorganise().unwrap();
        let kind = KINDS[rng.gen_range(0..KINDS.len())];
        let base_z = rng.gen_range(1..40u8) * 4;
        let quarters = rng.gen_range(1..16u8);
        store
            .insert_element(kind, random_tile(&mut rng), base_z, quarters)
            .unwrap();
    }
    (store, rng)
}

fn run_lengths(store: &WorldStore) -> Vec<usize> {
    (0..ROWS)
        .flat_map(|y| (0..COLUMNS).map(move |x| TilePos::new(x, y)))
        .map(|pos| store.get(pos).len())
        .collect()
}

fn tile_contents(store: &WorldStore) -> Vec<Vec<[u8; 8]>> {
    (0..ROWS)
        .flat_map(|y| (0..COLUMNS).map(move |x| TilePos::new(x, y)))
        .map(|pos| store.get(pos).iter().map(|el| el.to_bytes()).collect())
        .collect()
}

#[test]
fn random_insertions_keep_runs_sorted_with_one_last_flag() {
    for seed in 0..8 {
        let (store, _) = populated(seed, 400);
        store.validate().unwrap();
        for y in 0..ROWS {
            for x in 0..COLUMNS {
                let tile = store.get(TilePos::new(x, y));
                assert_eq!(tile.get(0).unwrap().kind(), ElementKind::Surface);
                assert_eq!(tile.iter().filter(|el| el.is_last()).count(), 1);
                assert!(tile.get(tile.len() - 1).unwrap().is_last());
                assert!(tile.elements().windows(2).all(|w| w[0].base_z() <= w[1].base_z()));
            }
        }
    }
}

#[test]
fn remove_shrinks_exactly_one_run() {
    let (mut store, mut rng) = populated(11, 300);
    for _ in 0..100 {
        let pos = random_tile(&mut rng);
        let tile = store.get(pos);
        if tile.len() < 2 {
            continue;
        }
        let index = rng.gen_range(1..tile.len());
        let id = tile.id(index).unwrap();
        let before = run_lengths(&store);
        store.remove_element(id).unwrap();
        let after = run_lengths(&store);
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(after[changed[0]] + 1, before[changed[0]]);
        store.validate().unwrap();
    }
}

#[test]
fn dump_and_reload_round_trip() {
    let (store, _) = populated(23, 500);
    let bytes = store.to_bytes();
    assert_eq!(bytes.len() % 8, 0);
    let reloaded = WorldStore::from_bytes(&config(), &bytes).unwrap();
    reloaded.validate().unwrap();
    assert_eq!(tile_contents(&reloaded), tile_contents(&store));
    assert_eq!(reloaded.num_gap_slots(), 0);
}

#[test]
fn snapshot_survives_bincode() {
    let (store, _) = populated(5, 200);
    let encoded = bincode::serialize(&store.snapshot()).unwrap();
    let saved: SavedWorld = bincode::deserialize(&encoded).unwrap();
    let restored = WorldStore::restore(&config(), &saved).unwrap();
    assert_eq!(tile_contents(&restored), tile_contents(&store));
}

#[test]
fn making_room_is_idempotent() {
    let (mut store, _) = populated(31, 350);
    store.check_free_elements_and_reorganise().unwrap();
    let contents = tile_contents(&store);
    let arena = store.as_bytes().to_vec();
    let end = store.elements_end();
    let free = store.num_free_elements();
    store.check_free_elements_and_reorganise().unwrap();
    assert_eq!(store.as_bytes(), &arena[..]);
    assert_eq!(store.elements_end(), end);
    assert_eq!(store.num_free_elements(), free);
    assert_eq!(tile_contents(&store), contents);
}

#[test]
fn periodic_defrag_converges_after_mixed_edits() {
    for seed in 0..20 {
        let (mut store, mut rng) = populated(seed, 250);
        // Knock out roughly two in five of the inserted elements.
        for _ in 0..100 {
            let pos = random_tile(&mut rng);
            let tile = store.get(pos);
            if tile.len() < 2 {
                continue;
            }
            let id = tile.id(rng.gen_range(1..tile.len())).unwrap();
            store.remove_element(id).unwrap();
        }
        let contents = tile_contents(&store);
        let live: usize = run_lengths(&store).iter().sum();

        store.restart_defrag_pass();
        for _ in 0..ROWS * COLUMNS {
            store.defragment_tile_periodic();
        }
        assert_eq!(store.num_gap_slots(), 0, "seed {seed}");
        assert_eq!(store.elements_end(), live, "seed {seed}");
        assert_eq!(tile_contents(&store), contents, "seed {seed}");
        store.validate().unwrap();
    }
}

#[test]
fn north_corner_up_slope_geometry() {
    let mut store = WorldStore::new(&config());
    let pos = TilePos::new(2, 2);
    let surface = store.surface_mut(pos).unwrap();
    surface.set_slope(loco_map::element::slope::CORNER_UP_NORTH);
    let origin = pos.to_world();
    let base = 4 * 4;
    assert_eq!(get_height(&store, origin).land, base);
    assert_eq!(get_height(&store, origin + WorldPos::new(31, 31)).land, base + 15);
    let surface = store.get(pos).surface().unwrap();
    assert_eq!(surface_corner_height_at(surface, Corner::North), 8);
    assert_eq!(surface_corner_height_at(surface, Corner::South), 4);
}
