//! Detector output in normalized image space and its conversion to pixels.
//!
//! A landmark's meaning is carried by its position in the list (the model's
//! fixed anatomical ordering), not by a stored id.

use crate::tracking::domain::frame_record::LandmarkPoint;

/// One landmark in normalized image coordinates, nominally within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
}

impl NormalizedLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Landmarks of the single face found in a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceMesh {
    points: Vec<NormalizedLandmark>,
}

impl FaceMesh {
    pub fn new(points: Vec<NormalizedLandmark>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NormalizedLandmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// False when any coordinate is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Scales every point by the frame size. Out-of-range values near the
    /// frame edges are kept as-is, never clipped.
    pub fn to_pixels(&self, width: u32, height: u32) -> Vec<LandmarkPoint> {
        let w = width as f64;
        let h = height as f64;
        self.points
            .iter()
            .map(|p| LandmarkPoint::new(p.x * w, p.y * h))
            .collect()
    }
}

/// Pixel-space landmarks for a frame; empty when nothing was detected.
pub fn extract_landmarks(detection: Option<&FaceMesh>, width: u32, height: u32) -> Vec<LandmarkPoint> {
    detection
        .map(|mesh| mesh.to_pixels(width, height))
        .unwrap_or_default()
}
