// Company registry as seen by the clearance engine.
//
// Clearance only needs to know, per owner id, whether the company is a human
// player and two AI planning flags: `ai_plan_preempted` is set when a human
// builds over land an AI had claimed, and `ai_plan_locked` marks an AI whose
// claim must not be overridden. Unknown ids read as non-player AIs with no
// flags.
//
// See also: `clearance.rs` (`ai_company_about_to_build_check`).

use crate::types::CompanyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub is_player: bool,
    #[serde(default)]
    pub ai_plan_preempted: bool,
    #[serde(default)]
    pub ai_plan_locked: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRegistry {
    pub companies: BTreeMap<CompanyId, Company>,
}

impl CompanyRegistry {
    pub fn insert(&mut self, id: CompanyId, company: Company) {
        self.companies.insert(id, company);
    }

    pub fn get(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn get_mut(&mut self, id: CompanyId) -> Option<&mut Company> {
        self.companies.get_mut(&id)
    }

    pub fn is_player(&self, id: CompanyId) -> bool {
        self.get(id).is_some_and(|c| c.is_player)
    }
}
