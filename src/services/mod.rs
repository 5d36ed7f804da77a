pub mod notifier;
pub mod ticket_backend;

pub use notifier::{Notification, NotificationLevel, Notifier};
pub use ticket_backend::TicketBackend;
