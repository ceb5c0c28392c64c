//! Error types for citescope-core

use thiserror::Error;

/// Main error type for the citescope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Brand not found
    #[error("brand not found: {0}")]
    BrandNotFound(String),
}

/// Result type alias for citescope-core
pub type Result<T> = std::result::Result<T, Error>;
