use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::stores::document_store::DocumentStore;
use crate::stores::memory_store::MemoryStore;
use crate::stores::remote_store::RemoteStore;
use crate::stores::seed;

const STORAGE_KEY_CONFIG: &str = "photoshare_config";

/// Default image shown when a post image fails to load
pub const DEFAULT_FALLBACK_IMAGE: &str = "/fallback.svg";

/// Which database the app talks to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process store, optionally filled with demo data
    Memory { seed_demo_data: bool },
    /// Firestore REST API
    Firestore {
        project_id: String,
        #[serde(default)]
        api_key: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Memory { seed_demo_data: true }
    }
}

/// App configuration, persisted in LocalStorage
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "default_fallback_image")]
    pub fallback_image_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u32, // remote backend only
}

fn default_fallback_image() -> String {
    DEFAULT_FALLBACK_IMAGE.to_string()
}

fn default_poll_interval() -> u32 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            fallback_image_url: default_fallback_image(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl AppConfig {
    /// Load from LocalStorage, falling back to defaults
    pub fn load() -> Self {
        match LocalStorage::get::<AppConfig>(STORAGE_KEY_CONFIG) {
            Ok(config) => {
                log::info!("Loaded config from LocalStorage: {:?}", config.backend);
                config
            }
            Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => {
                log::info!("No stored config, writing defaults");
                let config = Self::default();
                if let Err(e) = config.save() {
                    log::warn!("{}", e);
                }
                config
            }
            Err(e) => {
                log::warn!("Ignoring unreadable stored config: {}", e);
                Self::default()
            }
        }
    }

    /// Persist to LocalStorage so it can be edited between reloads
    pub fn save(&self) -> Result<(), String> {
        LocalStorage::set(STORAGE_KEY_CONFIG, self).map_err(|e| format!("Failed to save config: {}", e))
    }

    /// Construct the configured store. Called once at startup.
    pub fn build_store(&self) -> Arc<dyn DocumentStore> {
        match &self.backend {
            BackendConfig::Memory { seed_demo_data } => {
                let store = MemoryStore::new();
                if *seed_demo_data {
                    if let Err(e) = seed::load_demo_data(&store) {
                        log::error!("Failed to load demo data: {}", e);
                    }
                }
                Arc::new(store)
            }
            BackendConfig::Firestore { project_id, api_key } => Arc::new(RemoteStore::new(
                project_id.clone(),
                api_key.clone(),
                self.poll_interval_ms,
            )),
        }
    }
}
