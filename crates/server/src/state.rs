use std::sync::Arc;

use leadflow_core::{ActivityTracker, Config, CsvImporter, LeadStore, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn LeadStore>,
    importer: Arc<CsvImporter>,
    activity: ActivityTracker,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn LeadStore>,
        importer: Arc<CsvImporter>,
        activity: ActivityTracker,
    ) -> Self {
        Self {
            config,
            store,
            importer,
            activity,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn LeadStore {
        self.store.as_ref()
    }

    pub fn importer(&self) -> Arc<CsvImporter> {
        Arc::clone(&self.importer)
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }
}
