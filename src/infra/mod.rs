pub mod http;
pub mod mock;
pub mod notify;
