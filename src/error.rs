use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid payload: {0}")]
    Parse(String),
    #[error("ticket {0} not found")]
    NotFound(u64),
    #[error("invalid ticket: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Why a call to the ticket backend did not complete.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}
