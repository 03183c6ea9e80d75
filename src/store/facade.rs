use std::sync::Arc;

use super::{
    Backend, CartStore, CloudBackend, MemoryBackend, OrderStore, ProductStore, SettingStore,
    StoreError, StoreResult, UserStore,
};
use crate::config::{StorageConfig, StorageMode};

/// Single data-access entry point for services.
///
/// The backend is resolved once in [`DataStore::connect`] and never
/// re-resolved. A cloud backend that fails its first round-trip is replaced
/// by a memory backend for the rest of the process lifetime, and the reason
/// is kept for `/health`.
#[derive(Clone)]
pub struct DataStore {
    requested: StorageMode,
    served_by: StorageMode,
    fallback_reason: Option<Arc<str>>,
    backend: Arc<dyn Backend>,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    cart: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingStore>,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("requested", &self.requested)
            .field("served_by", &self.served_by)
            .field("fallback_reason", &self.fallback_reason)
            .finish()
    }
}

impl DataStore {
    pub async fn connect(config: &StorageConfig) -> StoreResult<Self> {
        Self::connect_with(config, MemoryBackend::new).await
    }

    /// Like [`DataStore::connect`], with `memory` building the backend used
    /// when the cloud is not configured or not reachable.
    pub async fn connect_with<F>(config: &StorageConfig, memory: F) -> StoreResult<Self>
    where
        F: FnOnce() -> MemoryBackend,
    {
        match config.storage_mode() {
            StorageMode::Memory => {
                tracing::info!("storage backend not configured, serving from memory");
                Ok(Self::from_backend(StorageMode::Memory, Arc::new(memory())))
            }
            StorageMode::Cloud => match Self::connect_cloud(config).await {
                Ok(cloud) => {
                    tracing::info!("serving from cloud backend");
                    Ok(Self::from_backend(StorageMode::Cloud, Arc::new(cloud)))
                }
                Err(err) if config.allow_memory_fallback => {
                    tracing::warn!(
                        error = %err,
                        "cloud backend unavailable, falling back to memory for this process"
                    );
                    Ok(Self::from_backend(StorageMode::Memory, Arc::new(memory()))
                        .with_fallback(err.to_string()))
                }
                Err(err) => Err(err),
            },
        }
    }

    async fn connect_cloud(config: &StorageConfig) -> StoreResult<CloudBackend> {
        let cloud = CloudBackend::connect(config).await?;
        cloud.ping().await?;
        Ok(cloud)
    }

    pub fn memory() -> Self {
        Self::from_backend(StorageMode::Memory, Arc::new(MemoryBackend::new()))
    }

    /// Wrap any backend that implements the full contract.
    pub fn from_backend<B>(mode: StorageMode, backend: Arc<B>) -> Self
    where
        B: Backend + ProductStore + UserStore + CartStore + OrderStore + SettingStore + 'static,
    {
        Self {
            requested: mode,
            served_by: mode,
            fallback_reason: None,
            backend: backend.clone(),
            products: backend.clone(),
            users: backend.clone(),
            cart: backend.clone(),
            orders: backend.clone(),
            settings: backend,
        }
    }

    fn with_fallback(mut self, reason: String) -> Self {
        self.requested = StorageMode::Cloud;
        self.fallback_reason = Some(reason.into());
        self
    }

    /// The mode the configuration asked for.
    pub fn requested_mode(&self) -> StorageMode {
        self.requested
    }

    /// The mode actually answering calls.
    pub fn mode(&self) -> StorageMode {
        self.served_by
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }

    pub fn products(&self) -> &dyn ProductStore {
        self.products.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn cart(&self) -> &dyn CartStore {
        self.cart.as_ref()
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingStore {
        self.settings.as_ref()
    }
}
