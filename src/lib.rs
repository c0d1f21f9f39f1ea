use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod api_errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases, date_codec, level, suggestions};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{storage, http};

use crate::constants::OWNER_MODE_KEY;
use crate::http::client::create_client;
use crate::repositories::{
    education_api::{EducationApi, HttpEducationApi},
    local_cache::LocalEducationStore,
};
use crate::storage::key_value::{FileStorage, KeyValueStorage};
use crate::use_cases::education_form::EducationFormHandler;

pub struct AppState {
    pub form_handler: AppFormHandler,
    pub storage: Arc<dyn KeyValueStorage>,
}

pub type AppFormHandler = EducationFormHandler<Arc<dyn EducationApi>, Arc<dyn KeyValueStorage>>;

impl AppState {
    pub fn new(config: &settings::AppConfig) -> anyhow::Result<Self> {
        let client = create_client(config)?;
        let api = HttpEducationApi::new(client, config.api_base()?, config.api_token.clone());

        let quota = (config.storage_quota_bytes > 0).then_some(config.storage_quota_bytes);
        let storage = FileStorage::open(&config.storage_path, quota);
        tracing::info!("Local storage at {}", storage.path().display());

        Ok(Self::from_parts(config, Arc::new(api), Arc::new(storage)))
    }

    /// Wires the form handler over any API and storage backend.
    pub fn from_parts(
        config: &settings::AppConfig,
        api: Arc<dyn EducationApi>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let stored = storage.get(OWNER_MODE_KEY).unwrap_or_else(|e| {
            tracing::warn!("Owner toggle unreadable: {}", e);
            None
        });
        let owner_mode = config.owner_mode(stored.as_deref());
        tracing::info!(?owner_mode, "Owner mode resolved");

        let form_handler = EducationFormHandler::new(
            api,
            LocalEducationStore::new(storage.clone()),
            config.fallback_policy(),
            owner_mode,
            config.date_range(),
        );

        AppState {
            form_handler,
            storage,
        }
    }
}
