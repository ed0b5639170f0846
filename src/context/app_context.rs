/// Application Context
///
/// Holds the document store constructed once at startup, plus the config it
/// was built from. Provided at the root with `use_context_provider` and read
/// by any component that needs data.
use std::sync::Arc;

use crate::stores::app_config::AppConfig;
use crate::stores::document_store::DocumentStore;

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub config: AppConfig,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let store = config.build_store();
        log::info!("Using {} document store", store.name());
        Self { store, config }
    }

    pub fn fallback_image_url(&self) -> &str {
        &self.config.fallback_image_url
    }
}
