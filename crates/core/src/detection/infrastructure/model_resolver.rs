use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::detection::domain::model_provider::{ModelProvider, ModelResolveError};
use crate::shared::constants::MODEL_CACHE_APP_DIR;

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name, checking local copies before downloading.
///
/// Resolution order:
/// 1. `cache_dir` (normally [`model_cache_dir`])
/// 2. Bundled directory (next to the executable, or a pre-packaged install)
/// 3. Download from `url` into `cache_dir`, when a URL is configured
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: Option<&str>,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if is_usable(&cached_path) {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(name);
        if is_usable(&bundled_path) {
            log::debug!("Using bundled model {}", bundled_path.display());
            return Ok(bundled_path);
        }
    }

    let Some(url) = url else {
        return Err(ModelResolveError::NoSource {
            name: name.to_string(),
            cache_dir: cache_dir.to_path_buf(),
        });
    };

    log::info!("Downloading model {name} to {}", cached_path.display());
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceLandmarks/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceLandmarks/models/` or `~/.cache/FaceLandmarks/models/`
/// - Windows: `%LOCALAPPDATA%/FaceLandmarks/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(MODEL_CACHE_APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(MODEL_CACHE_APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

/// An empty file is what an interrupted copy leaves behind; treat it as absent.
fn is_usable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: Box::new(e),
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |source| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    let mut reader = response;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Provides a model from an explicit path, the cache, a bundled directory,
/// or the network.
pub struct CachedModelProvider {
    name: String,
    url: Option<String>,
    cache_dir: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
    progress: Option<fn(u64, u64)>,
}

impl CachedModelProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            cache_dir: None,
            bundled_dir: None,
            explicit_path: None,
            progress: None,
        }
    }

    /// Where to fetch the model when no local copy exists.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Overrides the platform cache directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    pub fn with_bundled_dir(mut self, dir: PathBuf) -> Self {
        self.bundled_dir = Some(dir);
        self
    }

    /// Skips lookup and download entirely; the file must already exist.
    pub fn with_explicit_path(mut self, path: PathBuf) -> Self {
        self.explicit_path = Some(path);
        self
    }

    pub fn with_progress(mut self, progress: fn(u64, u64)) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl ModelProvider for CachedModelProvider {
    fn ensure_available(&self) -> Result<PathBuf, ModelResolveError> {
        if let Some(path) = &self.explicit_path {
            return if is_usable(path) {
                Ok(path.clone())
            } else {
                Err(ModelResolveError::Missing(path.clone()))
            };
        }

        let cache_dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => model_cache_dir()?,
        };
        let progress = self.progress.map(|f| Box::new(f) as ProgressFn);
        resolve_in(
            &cache_dir,
            &self.name,
            self.url.as_deref(),
            self.bundled_dir.as_deref(),
            progress,
        )
    }
}
