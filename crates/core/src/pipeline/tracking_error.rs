use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a landmark extraction run.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("video not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("could not open video {path}: {source}")]
    VideoOpen {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("landmark detection failed on frame {frame_number}: {source}")]
    Detection {
        frame_number: u64,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Decoding stopped before the end of the stream.
///
/// Not fatal: every frame before `frame_number` was recorded and the run
/// finalizes with that truncated count.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("decoding failed at frame {frame_number}: {message}")]
pub struct DecodeFailure {
    /// 1-based number the failed frame would have received.
    pub frame_number: u64,
    pub message: String,
}
