// Data stores
// Document database access, configuration and the profile view-model

pub mod app_config;
pub mod document_store;
pub mod memory_store;
pub mod profile_view;
pub mod remote_store;
pub mod seed;
