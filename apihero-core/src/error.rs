use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to pull a snapshot out of a record source. Every variant means
/// the source is unavailable; the previously installed index stays in place.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a captured request was left out of the site map.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("empty URL")]
    EmptyUrl,

    #[error("URL has no host")]
    MissingHost,

    #[error("entry could not be decoded")]
    InvalidEntry,
}

pub type Result<T> = std::result::Result<T, SourceError>;
