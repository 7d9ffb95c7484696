// The map aggregate: element store plus the collaborator data it consumes.
//
// `World` bundles the `WorldStore` with everything clearance and terraform
// need from outside the store: the object catalog, the inflation table, and
// the company registry. There is exactly one of these per loaded map and it
// is passed explicitly (`&mut World`) to every operation; nothing is global.
//
// See also: `store.rs` for the arena, `clearance.rs` and `terraform.rs` for
// the operations that take a `World`.

use crate::command::{CommandContext, ErrorText};
use crate::company::CompanyRegistry;
use crate::config::WorldConfig;
use crate::economy::Economy;
use crate::objects::ObjectCatalog;
use crate::store::WorldStore;

#[derive(Clone, Debug)]
pub struct World {
    pub config: WorldConfig,
    pub store: WorldStore,
    pub objects: ObjectCatalog,
    pub economy: Economy,
    pub companies: CompanyRegistry,
}

impl World {
    /// A flat map built from `config`.
    pub fn new(config: WorldConfig, objects: ObjectCatalog) -> Self {
        let store = WorldStore::new(&config);
        Self {
            config,
            store,
            objects,
            economy: Economy::default(),
            companies: CompanyRegistry::default(),
        }
    }

    /// Make room for a command's insertions. On failure the context carries
    /// "landscape data area full".
    pub fn check_free_elements_and_reorganise(&mut self, ctx: &mut CommandContext) -> bool {
        match self.store.check_free_elements_and_reorganise() {
            Ok(()) => true,
            Err(_) => {
                ctx.set_error(ErrorText::LandscapeDataAreaFull);
                false
            }
        }
    }
}
