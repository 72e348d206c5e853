use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::tracking::domain::result_store::{PersistenceError, ResultStore};
use crate::tracking::domain::tracking_result::TrackingResult;

/// Stores results as pretty-printed JSON, frames in ascending order.
///
/// Writes land in a sibling `.tmp` file that is renamed over the destination,
/// so a failed save leaves any previous file untouched. Results holding NaN
/// or infinite numbers are refused up front: JSON would write them as `null`
/// and the file could not be loaded back.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonResultStore;

impl JsonResultStore {
    pub fn new() -> Self {
        Self
    }
}

impl ResultStore for JsonResultStore {
    fn save(&self, result: &TrackingResult, path: &Path) -> Result<(), PersistenceError> {
        result
            .check_finite()
            .map_err(|reason| PersistenceError::NonFinite {
                path: path.to_path_buf(),
                reason,
            })?;

        let temp_path = path.with_extension("json.tmp");
        let outcome = write_json(result, path, &temp_path);
        if outcome.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        outcome
    }

    fn load(&self, path: &Path) -> Result<TrackingResult, PersistenceError> {
        let file = fs::File::open(path).map_err(|e| PersistenceError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let result: TrackingResult = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                PersistenceError::Read {
                    path: path.to_path_buf(),
                    source: e.into(),
                }
            } else {
                PersistenceError::Malformed {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                }
            }
        })?;
        result
            .check_consistency()
            .map_err(|reason| PersistenceError::Inconsistent {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(result)
    }
}

fn write_json(result: &TrackingResult, path: &Path, temp_path: &Path) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::create(temp_path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result).map_err(|e| {
        if e.is_io() {
            write_err(e.into())
        } else {
            PersistenceError::Encode {
                path: path.to_path_buf(),
                source: Box::new(e),
            }
        }
    })?;
    writer.write_all(b"\n").map_err(write_err)?;
    let file = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, path).map_err(write_err)?;
    log::debug!("Wrote {} frame records to {}", result.frames.len(), path.display());
    Ok(())
}
