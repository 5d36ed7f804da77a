pub mod draft;
pub mod tickets;
