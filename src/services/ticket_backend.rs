use async_trait::async_trait;

use crate::domain::ticket::{Ticket, TicketFields};
use crate::error::AppResult;

/// The authority that owns tickets and assigns their ids.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Ticket>>;
    async fn fetch(&self, id: u64) -> AppResult<Ticket>;
    async fn create(&self, fields: &TicketFields) -> AppResult<Ticket>;
    async fn replace(&self, id: u64, fields: &TicketFields) -> AppResult<Ticket>;
    async fn delete(&self, id: u64) -> AppResult<()>;
}
