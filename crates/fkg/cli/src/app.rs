use fkg_pkg::PkgContext;
use fkg_storage::InMemoryGraphStore;
use fkg_types::{RecordValidator, Settings, StorageSettings};
use fkg_validate::SchemaRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a command needs, built once from settings.
pub struct App {
    pub settings: Settings,
    pub validator: Arc<dyn RecordValidator>,
    /// Entity types with a schema for the instance's schema version
    pub entity_types: Vec<String>,
    pub store: InMemoryGraphStore,
}

impl App {
    pub fn open(settings: Settings) -> anyhow::Result<Self> {
        let registry = match &settings.schemas_dir {
            Some(dir) => SchemaRegistry::load_dir(dir)?,
            None => SchemaRegistry::builtin()?,
        };
        debug!(schemas = registry.len(), versions = ?registry.versions(), "schemas loaded");
        let entity_types = registry.entity_types(&settings.instance.schema_version);
        let validator: Arc<dyn RecordValidator> = Arc::new(registry);

        let store = match &settings.storage {
            StorageSettings::Memory => {
                warn!("using in-memory storage; nothing will be persisted");
                InMemoryGraphStore::new(validator.clone())
            }
            StorageSettings::File { path } => InMemoryGraphStore::open(path, validator.clone())?,
        };

        Ok(Self {
            settings,
            validator,
            entity_types,
            store,
        })
    }

    pub fn pkg_context(&self) -> PkgContext {
        PkgContext::new(self.settings.instance.clone(), self.validator.clone())
    }
}
