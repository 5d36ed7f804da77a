use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::storage::{KeyValueStore, StorageHandle};

/// A value bound to one storage key: restored when opened, written through
/// on every change, and kept in step with writes made by other handles.
///
/// Concurrent writers are last-writer-wins.
pub struct PersistedState<T> {
    key: String,
    handle: StorageHandle,
    state: Arc<watch::Sender<T>>,
}

impl<T> PersistedState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Restores the stored value, or `initial` if nothing usable is stored.
    pub fn open(handle: StorageHandle, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let value = match handle.get_item(&key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!("ignoring unreadable value under '{key}': {err}");
                initial
            }),
            Ok(None) => initial,
            Err(err) => {
                tracing::warn!("failed to read '{key}': {err}");
                initial
            }
        };

        let (state, _) = watch::channel(value);
        Self {
            key,
            handle,
            state: Arc::new(state),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> T {
        T::clone(&self.state.borrow())
    }

    /// Updates local state and persists it before returning.
    pub fn set(&self, value: T) -> AppResult<()> {
        let raw = serde_json::to_string(&value)
            .map_err(|err| AppError::Parse(format!("failed to encode '{}': {err}", self.key)))?;
        self.state.send_replace(value);
        self.handle.set_item(&self.key, &raw)
    }

    pub fn update(&self, change: impl FnOnce(&T) -> T) -> AppResult<()> {
        let next = change(&self.state.borrow());
        self.set(next)
    }

    /// Observes local state, including changes picked up by the listener.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Starts following writes to this key made through other handles. The
    /// listener stops when the returned guard is dropped.
    pub fn listen(&self) -> Listener {
        let mut events = self.handle.events();
        let key = self.key.clone();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event.key != key {
                    continue;
                }
                // Removals are not propagated.
                let Some(raw) = event.new_value else {
                    continue;
                };
                match serde_json::from_str::<T>(&raw) {
                    Ok(value) => {
                        state.send_replace(value);
                    }
                    Err(err) => tracing::warn!("ignoring unreadable change to '{key}': {err}"),
                }
            }
        });

        Listener { task }
    }
}

pub struct Listener {
    task: JoinHandle<()>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::storage::SharedStorage;

    const KEY: &str = "ticket-draft";

    async fn next_value<T: Clone>(rx: &mut watch::Receiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        T::clone(&rx.borrow_and_update())
    }

    #[test]
    fn restores_stored_value_or_falls_back() {
        let shared = SharedStorage::in_memory();
        let handle = shared.open_handle();

        let fresh = PersistedState::open(handle.clone(), KEY, Some(1u32));
        assert_eq!(fresh.get(), Some(1));

        fresh.set(Some(5)).unwrap();
        let reopened = PersistedState::open(shared.open_handle(), KEY, None::<u32>);
        assert_eq!(reopened.get(), Some(5));

        handle.set_item(KEY, "{broken").unwrap();
        let broken = PersistedState::open(handle, KEY, Some(9u32));
        assert_eq!(broken.get(), Some(9));
    }

    #[test]
    fn null_sentinel_clears_value() {
        let shared = SharedStorage::in_memory();
        let state = PersistedState::open(shared.open_handle(), KEY, None::<String>);
        state.set(Some("half typed".to_string())).unwrap();
        state.set(None).unwrap();

        let handle = shared.open_handle();
        assert_eq!(handle.get_item(KEY).unwrap().as_deref(), Some("null"));
    }

    #[test]
    fn update_applies_to_current_value() {
        let shared = SharedStorage::in_memory();
        let state = PersistedState::open(shared.open_handle(), "counter", 1u32);
        state.update(|n| n + 1).unwrap();
        state.update(|n| n * 10).unwrap();
        assert_eq!(state.get(), 20);
    }

    #[tokio::test]
    async fn follows_writes_from_another_handle() {
        let shared = SharedStorage::in_memory();
        let first_tab = PersistedState::open(shared.open_handle(), KEY, None::<String>);
        let second_tab = PersistedState::open(shared.open_handle(), KEY, None::<String>);
        let _listener = second_tab.listen();
        let mut observed = second_tab.subscribe();

        first_tab.set(Some("from the first tab".to_string())).unwrap();

        assert_eq!(
            next_value(&mut observed).await.as_deref(),
            Some("from the first tab")
        );
        assert_eq!(second_tab.get().as_deref(), Some("from the first tab"));
    }

    #[tokio::test]
    async fn ignores_other_keys_and_removals() {
        let shared = SharedStorage::in_memory();
        let writer = shared.open_handle();
        let state = PersistedState::open(shared.open_handle(), KEY, 0u32);
        let _listener = state.listen();
        let mut observed = state.subscribe();

        writer.set_item("tickets", "[]").unwrap();
        writer.remove_item(KEY).unwrap();
        writer.set_item(KEY, "7").unwrap();

        assert_eq!(next_value(&mut observed).await, 7);
    }

    #[tokio::test]
    async fn dropped_listener_stops_following() {
        let shared = SharedStorage::in_memory();
        let writer = PersistedState::open(shared.open_handle(), KEY, 0u32);
        let reader = PersistedState::open(shared.open_handle(), KEY, 0u32);

        drop(reader.listen());
        writer.set(3).unwrap();
        tokio::task::yield_now().await;

        assert_eq!(reader.get(), 0);
    }
}
