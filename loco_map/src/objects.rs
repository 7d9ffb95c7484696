// Object metadata consumed by the clearance and terraform code.
//
// The map store never owns object definitions; it only needs a handful of
// facts about them: display names for "X in the way" messages, demolition
// cost factors, and a few behaviour flags (headquarters buildings can't be
// cleared, 2×2 buildings span four tiles, desert land). `ObjectCatalog`
// holds exactly those facts, keyed by the object ids stored in elements.
//
// Maps are `BTreeMap` so iteration order (and therefore anything derived from
// it) is deterministic. The catalog loads from JSON like `WorldConfig`.
//
// See also: `clearance.rs` for the clear functions that price trees and
// buildings, `terraform.rs` for land and water costs, `survey.rs` for the
// desert count.

use crate::config::ConfigError;
use crate::types::{Currency, IndustryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price inputs for `Economy::inflation_adjusted_cost`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFactor {
    pub factor: Currency,
    pub cost_index: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeObject {
    pub name: String,
    pub clear_cost: CostFactor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingObject {
    pub name: String,
    pub clear_cost: CostFactor,
    /// Company headquarters: never removed by clearance.
    #[serde(default)]
    pub is_headquarters: bool,
    /// Occupies a 2×2 block of tiles.
    #[serde(default)]
    pub is_large: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedObject {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandObject {
    pub name: String,
    /// Charged per terraform step.
    pub cost: CostFactor,
    #[serde(default)]
    pub is_desert: bool,
}

/// A placed industry, named for messages like "Coal Mine (Springfield) in the way".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryInfo {
    pub name: String,
    pub town: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectCatalog {
    pub trees: BTreeMap<u8, TreeObject>,
    pub buildings: BTreeMap<u8, BuildingObject>,
    pub tracks: BTreeMap<u8, NamedObject>,
    pub roads: BTreeMap<u8, NamedObject>,
    pub land: BTreeMap<u8, LandObject>,
    pub industries: BTreeMap<u8, IndustryInfo>,
    /// Charged for raising or lowering water by one step.
    pub water_cost: CostFactor,
}

impl ObjectCatalog {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tree(&self, id: u8) -> Option<&TreeObject> {
        self.trees.get(&id)
    }

    pub fn building(&self, id: u8) -> Option<&BuildingObject> {
        self.buildings.get(&id)
    }

    pub fn track(&self, id: u8) -> Option<&NamedObject> {
        self.tracks.get(&id)
    }

    pub fn road(&self, id: u8) -> Option<&NamedObject> {
        self.roads.get(&id)
    }

    pub fn land(&self, id: u8) -> Option<&LandObject> {
        self.land.get(&id)
    }

    pub fn industry(&self, id: IndustryId) -> Option<&IndustryInfo> {
        self.industries.get(&id.0)
    }

    /// A small catalog with one object of each sort, for tests and demos.
    pub fn sample() -> Self {
        let mut catalog = Self::default();
        catalog.trees.insert(
            0,
            TreeObject {
                name: "Oak Tree".into(),
                clear_cost: CostFactor { factor: 4096, cost_index: 1 },
            },
        );
        catalog.buildings.insert(
            0,
            BuildingObject {
                name: "Cottage".into(),
                clear_cost: CostFactor { factor: 512, cost_index: 2 },
                is_headquarters: false,
                is_large: false,
            },
        );
        catalog.buildings.insert(
            1,
            BuildingObject {
                name: "Office Block".into(),
                clear_cost: CostFactor { factor: 1024, cost_index: 2 },
                is_headquarters: false,
                is_large: true,
            },
        );
        catalog.buildings.insert(
            2,
            BuildingObject {
                name: "Company Headquarters".into(),
                clear_cost: CostFactor { factor: 1024, cost_index: 2 },
                is_headquarters: true,
                is_large: false,
            },
        );
        catalog.tracks.insert(0, NamedObject { name: "Standard Track".into() });
        catalog.roads.insert(0, NamedObject { name: "Road".into() });
        catalog.land.insert(
            0,
            LandObject {
                name: "Grass".into(),
                cost: CostFactor { factor: 256, cost_index: 3 },
                is_desert: false,
            },
        );
        catalog.land.insert(
            1,
            LandObject {
                name: "Sand".into(),
                cost: CostFactor { factor: 256, cost_index: 3 },
                is_desert: true,
            },
        );
        catalog.industries.insert(
            0,
            IndustryInfo {
                name: "Coal Mine".into(),
                town: "Springfield".into(),
            },
        );
        catalog.water_cost = CostFactor { factor: 512, cost_index: 3 };
        catalog
    }
}
