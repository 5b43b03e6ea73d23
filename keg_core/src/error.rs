use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KegError {
    #[error("store error: {0}")]
    Store(String),
    #[error("timeout waiting for store")]
    StoreTimeout,
    #[error("unknown keg size: {0} l")]
    UnknownKeg(i32),
    #[error("invalid scale message: {0}")]
    InvalidMessage(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing store")]
    MissingStore,
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
