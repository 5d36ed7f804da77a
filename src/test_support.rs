//! Shared fixtures for workflow tests.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, StoredConfig};
use crate::context::AppContext;
use crate::infra::mock::MockBackend;
use crate::infra::notify::NotificationCenter;
use crate::services::NotificationLevel;
use crate::storage::SharedStorage;

pub struct TestApp {
    pub ctx: AppContext,
    pub backend: Arc<MockBackend>,
    pub notifications: Arc<NotificationCenter>,
    pub storage: SharedStorage,
}

impl TestApp {
    pub fn seeded() -> Self {
        let storage = SharedStorage::in_memory();
        Self::on(storage)
    }

    /// Another app instance sharing `storage`, like a second browser tab.
    pub fn on(storage: SharedStorage) -> Self {
        let config = AppConfig::resolve(StoredConfig {
            backend: Some("mock".to_string()),
            data_dir: Some("unused".to_string()),
            ..StoredConfig::default()
        })
        .unwrap();
        let backend = Arc::new(MockBackend::seeded(Duration::ZERO));
        let notifications = Arc::new(NotificationCenter::new(Duration::from_secs(60)));
        let ctx = AppContext::new(
            config,
            backend.clone(),
            storage.open_handle(),
            notifications.clone(),
        );
        Self {
            ctx,
            backend,
            notifications,
            storage,
        }
    }

    pub fn levels(&self) -> Vec<NotificationLevel> {
        self.notifications.active().iter().map(|n| n.level).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .active()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}
