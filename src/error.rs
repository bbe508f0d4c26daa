use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),
    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{operation} timed out after {}s", .after.as_secs())]
    TimeoutError {
        operation: &'static str,
        after: Duration,
    },
    #[error("{0}")]
    ServerError(String),
    #[error("Contract violation: {0}")]
    ContractViolationError(String),
    #[error("A payment flow is already active")]
    FlowAlreadyActiveError,
    #[error("The previous payment flow has finished but was not reset")]
    FlowNotResetError,
    #[error("A payment flow can only be started inside a tokio runtime")]
    NoRuntimeError,
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
