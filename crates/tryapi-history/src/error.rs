//! Error types for schema history

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt history file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History entry not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
