use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::domain::ticket::{Category, Priority, Status, Ticket, TicketFields};
use crate::error::{AppError, AppResult, TransportError};
use crate::services::TicketBackend;

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(400);

/// In-process stand-in for the ticket service. Every call waits `latency`
/// before answering so callers see realistic pending states.
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Duration,
}

struct MockState {
    tickets: Vec<Ticket>,
    next_id: u64,
    reachable: bool,
}

impl MockBackend {
    pub fn empty(latency: Duration) -> Self {
        Self::with_tickets(Vec::new(), latency)
    }

    /// Starts with two sample tickets so the list view has something to show.
    pub fn seeded(latency: Duration) -> Self {
        let now = Utc::now();
        let tickets = vec![
            Ticket {
                id: 1,
                title: "Error al iniciar sesión".to_string(),
                description: "No puedo acceder a mi cuenta con mis credenciales habituales"
                    .to_string(),
                category: Category::Technical,
                priority: Priority::High,
                status: Status::Open,
                created_at: now.into(),
                user: "Usuario Demo".to_string(),
            },
            Ticket {
                id: 2,
                title: "Consulta sobre facturación".to_string(),
                description: "Necesito una copia de la factura del mes pasado".to_string(),
                category: Category::Billing,
                priority: Priority::Medium,
                status: Status::InProgress,
                created_at: (now - TimeDelta::days(1)).into(),
                user: "Usuario Demo".to_string(),
            },
        ];
        Self::with_tickets(tickets, latency)
    }

    pub fn with_tickets(tickets: Vec<Ticket>, latency: Duration) -> Self {
        let next_id = tickets.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(MockState {
                tickets,
                next_id,
                reachable: true,
            }),
            latency,
        }
    }

    /// While unreachable every call fails with a transport error.
    pub async fn set_reachable(&self, reachable: bool) {
        self.state.lock().await.reachable = reachable;
    }

    pub async fn snapshot(&self) -> Vec<Ticket> {
        self.state.lock().await.tickets.clone()
    }

    async fn begin(&self) -> AppResult<tokio::sync::MutexGuard<'_, MockState>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let state = self.state.lock().await;
        if !state.reachable {
            return Err(TransportError::Unreachable("mock backend is offline".to_string()).into());
        }
        Ok(state)
    }
}

impl MockState {
    fn position(&self, id: u64) -> AppResult<usize> {
        self.tickets
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::NotFound(id))
    }
}

#[async_trait]
impl TicketBackend for MockBackend {
    async fn list(&self) -> AppResult<Vec<Ticket>> {
        let state = self.begin().await?;
        Ok(state.tickets.clone())
    }

    async fn fetch(&self, id: u64) -> AppResult<Ticket> {
        let state = self.begin().await?;
        let index = state.position(id)?;
        Ok(state.tickets[index].clone())
    }

    async fn create(&self, fields: &TicketFields) -> AppResult<Ticket> {
        let mut state = self.begin().await?;
        let id = state.next_id;
        state.next_id += 1;
        let ticket = Ticket::from_fields(id, fields.clone(), Utc::now());
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn replace(&self, id: u64, fields: &TicketFields) -> AppResult<Ticket> {
        let mut state = self.begin().await?;
        let index = state.position(id)?;
        let ticket = &mut state.tickets[index];
        ticket.apply(fields);
        Ok(ticket.clone())
    }

    async fn delete(&self, id: u64) -> AppResult<()> {
        let mut state = self.begin().await?;
        let index = state.position(id)?;
        state.tickets.remove(index);
        Ok(())
    }
}
