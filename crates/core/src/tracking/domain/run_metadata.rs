use serde::{Deserialize, Serialize};

/// Summary of a completed run, persisted under the `metadata` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub video_path: String,
    /// Frames actually decoded, which may be fewer than the container reported.
    pub total_frames: u64,
    pub fps: f64,
    pub duration_seconds: f64,
    pub frames_with_face: u64,
}

impl RunMetadata {
    pub fn new(video_path: impl Into<String>, total_frames: u64, fps: f64, frames_with_face: u64) -> Self {
        Self {
            video_path: video_path.into(),
            total_frames,
            fps,
            duration_seconds: duration_for(total_frames, fps),
            frames_with_face,
        }
    }
}

/// `total_frames / fps`; containers that report no frame rate get a duration of 0.
pub fn duration_for(total_frames: u64, fps: f64) -> f64 {
    if fps > 0.0 && fps.is_finite() {
        total_frames as f64 / fps
    } else {
        0.0
    }
}
