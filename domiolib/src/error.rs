//! Единый тип ошибок публичного API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomioError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("coverage gap: {0}")]
    CoverageGap(String),

    #[error("allocation mismatch: {0}")]
    AllocationMismatch(String),

    #[error("non-confirmed payment: {0}")]
    NonConfirmedPayment(String),

    #[error("invalid transition: {0}")]
    Transition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, DomioError>;
