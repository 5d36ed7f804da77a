pub mod config;
pub mod draft;
pub mod tickets;
