use std::sync::Arc;

use crate::cache::TicketCache;
use crate::config::{AppConfig, BackendKind};
use crate::error::AppResult;
use crate::infra::http::HttpBackend;
use crate::infra::mock::MockBackend;
use crate::services::{Notifier, TicketBackend};
use crate::storage::{FileStore, SharedStorage, StorageHandle};
use crate::sync::TicketService;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub tickets: TicketService,
    pub storage: StorageHandle,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn TicketBackend>,
        storage: StorageHandle,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cache = TicketCache::new(Arc::new(storage.clone()));
        Self {
            config,
            tickets: TicketService::new(backend, cache),
            storage,
            notifier,
        }
    }

    /// Wires the configured backend to a file-backed store under the data
    /// directory.
    pub fn from_config(config: AppConfig, notifier: Arc<dyn Notifier>) -> AppResult<Self> {
        let backend: Arc<dyn TicketBackend> = match config.backend {
            BackendKind::Http => Arc::new(HttpBackend::new(config.api_base_url.clone())?),
            BackendKind::Mock => Arc::new(MockBackend::seeded(config.mock_latency)),
        };
        let storage = SharedStorage::new(Arc::new(FileStore::new(config.data_dir.clone())));
        let handle = storage.open_handle();
        Ok(Self::new(config, backend, handle, notifier))
    }
}
