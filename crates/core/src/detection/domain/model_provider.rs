use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {name} is not in {cache_dir} and no download URL is configured")]
    NoSource { name: String, cache_dir: PathBuf },
}

/// Supplies a local path to a model file, fetching it first if needed.
///
/// Calling this repeatedly must be cheap once the model is on disk.
pub trait ModelProvider {
    fn ensure_available(&self) -> Result<PathBuf, ModelResolveError>;
}
