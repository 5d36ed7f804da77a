use std::sync::Arc;

use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;

pub const TICKETS_KEY: &str = "tickets";

/// The locally persisted copy of the ticket collection, stored as a single
/// JSON array.
#[derive(Clone)]
pub struct TicketCache {
    store: Arc<dyn KeyValueStore>,
}

impl TicketCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The cached collection, or `None` on a miss. Unreadable or corrupt
    /// contents count as a miss.
    pub fn read(&self) -> Option<Vec<Ticket>> {
        let contents = match self.store.get_item(TICKETS_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("failed to read ticket cache: {err}");
                return None;
            }
        };

        match serde_json::from_str::<Vec<Ticket>>(&contents) {
            Ok(tickets) => Some(tickets),
            Err(err) => {
                tracing::warn!("ignoring corrupt ticket cache: {err}");
                None
            }
        }
    }

    /// Replaces the whole cached collection.
    pub fn write(&self, tickets: &[Ticket]) -> AppResult<()> {
        let data = serde_json::to_string(tickets)
            .map_err(|err| AppError::Parse(format!("failed to encode ticket cache: {err}")))?;
        self.store.set_item(TICKETS_KEY, &data)
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.remove_item(TICKETS_KEY)
    }
}
