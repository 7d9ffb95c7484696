// Data-driven map store configuration.
//
// Map dimensions, arena sizing, compaction tuning, the sea-level datum for
// freshly initialised maps, and the land height limits used by terraforming
// all live in `WorldConfig`, loaded from JSON. The store and the terraform
// commands read these values instead of hard-coding them, so tests can run
// on tiny maps with a small slack.
//
// Every field has a `#[serde(default)]` so partial JSON documents (the common
// case in tests) only need to name the fields they change.
//
// See also: `store.rs` which sizes its arena from `capacity()`,
// `terraform.rs` for the land height bounds, `objects.rs` for the companion
// `ObjectCatalog` data file.

use crate::types::SmallZ;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a config or object catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map dimensions {rows}x{columns} are not usable")]
    BadDimensions { rows: i32, columns: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Tiles along y.
    pub rows: i32,
    /// Tiles along x.
    pub columns: i32,
    /// Arena slots allocated per tile.
    pub elements_per_tile: usize,
    /// Free slots a command must be able to count on before it starts
    /// inserting. Also the most elements one tile may hold.
    pub free_slack: usize,
    /// Periodic defragmentation rounds tried before a full reorganise.
    pub defrag_rounds: u32,
    /// base_z of the flat surface laid on every tile by `initialise`.
    pub sea_level_z: SmallZ,
    /// Terrain object for freshly initialised surfaces.
    pub default_terrain: u8,
    /// Lowest surface base_z terraforming may produce.
    pub min_land_z: SmallZ,
    /// Surface base_z must stay below this.
    pub max_land_z: SmallZ,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rows: 384,
            columns: 384,
            elements_per_tile: 3,
            free_slack: 1024,
            defrag_rounds: 1000,
            sea_level_z: 4,
            default_terrain: 0,
            min_land_z: 4,
            max_land_z: 160,
        }
    }
}

impl WorldConfig {
    /// A config for a small test map, with slack scaled down to fit.
    pub fn small(rows: i32, columns: i32) -> Self {
        Self {
            rows,
            columns,
            free_slack: 4,
            defrag_rounds: 16,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows <= 0 || self.columns <= 0 {
            return Err(ConfigError::BadDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }

    pub fn tile_count(&self) -> usize {
        self.rows.max(0) as usize * self.columns.max(0) as usize
    }

    /// Total arena slots.
    pub fn capacity(&self) -> usize {
        self.tile_count() * self.elements_per_tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = WorldConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = WorldConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
        assert_eq!(restored.capacity(), 3 * 384 * 384);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = WorldConfig::from_json(r#"{ "rows": 8, "columns": 4 }"#).unwrap();
        assert_eq!(config.rows, 8);
        assert_eq!(config.columns, 4);
        assert_eq!(config.free_slack, 1024);
        assert_eq!(config.sea_level_z, 4);
        assert_eq!(config.capacity(), 96);
    }

    #[test]
    fn zero_sized_map_is_rejected() {
        let err = WorldConfig::from_json(r#"{ "rows": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::BadDimensions { rows: 0, .. }));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = WorldConfig::from_json("{ rows: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
