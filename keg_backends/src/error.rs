use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("store worker is gone")]
    WorkerGone,
    #[error("corrupt store document: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook answered {0}")]
    Status(u16),
}

pub type Result<T> = std::result::Result<T, StoreError>;
