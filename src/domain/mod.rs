pub mod draft;
pub mod filter;
pub mod ticket;

pub use draft::{FieldError, FormField, TicketDraft};
pub use filter::{TicketFilter, TicketStats};
pub use ticket::{Category, Priority, Status, Ticket, TicketFields, Timestamp};
