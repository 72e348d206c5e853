use std::path::PathBuf;

/// Container-level facts read once when a source is opened.
///
/// `total_frames` is the container's own estimate and only drives progress
/// reporting; the number of frames actually decoded is authoritative.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}
