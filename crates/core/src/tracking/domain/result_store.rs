use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tracking::domain::tracking_result::TrackingResult;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode result for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("refusing to write {path}: {reason}")]
    NonFinite { path: PathBuf, reason: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed landmark file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("inconsistent landmark file {path}: {reason}")]
    Inconsistent { path: PathBuf, reason: String },
}

/// Durable storage for a finished [`TrackingResult`].
pub trait ResultStore {
    /// Fails without touching `path` when the result holds a value the
    /// format cannot carry (NaN or infinite numbers).
    fn save(&self, result: &TrackingResult, path: &Path) -> Result<(), PersistenceError>;

    /// Fails on a missing, unreadable, malformed, or self-contradicting
    /// document; never returns an empty result in its place.
    fn load(&self, path: &Path) -> Result<TrackingResult, PersistenceError>;
}
