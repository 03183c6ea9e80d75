use std::sync::Arc;

use crate::{config::AppConfig, store::DataStore};

#[derive(Clone)]
pub struct AppState {
    pub store: DataStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: DataStore, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
