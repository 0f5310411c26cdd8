use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a store mutation was refused. A refused mutation leaves the store untouched.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("record {index} does not exist, the store holds {len} records")]
    RecordOutOfRange { index: usize, len: usize },
    #[error("'{raw}' is not a number for {field}")]
    InvalidNumber { field: String, raw: String },
    #[error("nothing was supplied")]
    EmptySubmission,
    #[error("unknown vitals field '{0}'")]
    UnknownField(String),
}

impl StoreError {
    /// No-op submissions and rejected input are expected during normal charting.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            StoreError::EmptySubmission | StoreError::InvalidNumber { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("'{0}' is not a usable time format")]
    TimeFormat(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read section capture {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("section {index} has no area ({width}x{height})")]
    InvalidSection {
        index: usize,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("{table} row {index} does not exist")]
    RowOutOfRange { table: &'static str, index: usize },
}
