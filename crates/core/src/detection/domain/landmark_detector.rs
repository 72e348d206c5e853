use crate::detection::domain::face_landmarks::FaceMesh;
use crate::shared::frame::Frame;

/// Domain interface for single-face landmark detection.
///
/// Expects an RGB frame. Returns `None` when no face is present; only the
/// first face is reported even if the model sees several.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<FaceMesh>, Box<dyn std::error::Error>>;
}
