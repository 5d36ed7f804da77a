use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use blake3::Hasher;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::{AppError, AppResult};

const EVENT_BUFFER: usize = 64;

/// String key/value storage with local-storage semantics: whole values are
/// read and replaced, never patched.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> AppResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove_item(&self, key: &str) -> AppResult<()>;
}

/// Keeps each key in its own file under `dir`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }

    /// Keys are arbitrary strings, so file names are derived from a hash.
    pub fn file_name(key: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(key.as_bytes());
        let hex = hasher.finalize().to_hex();
        format!("{}.json", &hex.as_str()[..16])
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(err)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// A change made through one handle, delivered to every other handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    origin: u64,
}

/// One store shared by several independent handles, like browser tabs on
/// one origin.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<SharedInner>,
}

struct SharedInner {
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorageEvent>,
    next_handle: AtomicU64,
}

impl SharedStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(SharedInner {
                store,
                events,
                next_handle: AtomicU64::new(1),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn open_handle(&self) -> StorageHandle {
        let id = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        StorageHandle {
            id,
            shared: self.clone(),
        }
    }
}

/// A view onto the shared store. Clones are the same handle and do not see
/// each other's changes as external.
#[derive(Clone)]
pub struct StorageHandle {
    id: u64,
    shared: SharedStorage,
}

impl StorageHandle {
    /// Changes made through other handles from now on.
    pub fn events(&self) -> StorageEvents {
        StorageEvents {
            handle: self.id,
            receiver: self.shared.inner.events.subscribe(),
        }
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        // No receivers is fine.
        let _ = self.shared.inner.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin: self.id,
        });
    }
}

impl KeyValueStore for StorageHandle {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        self.shared.inner.store.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.shared.inner.store.set_item(key, value)?;
        self.publish(key, Some(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.shared.inner.store.remove_item(key)?;
        self.publish(key, None);
        Ok(())
    }
}

pub struct StorageEvents {
    handle: u64,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl StorageEvents {
    /// Waits for the next change made by another handle. Returns `None` once
    /// the shared store is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.origin != self.handle => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("storage listener lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
