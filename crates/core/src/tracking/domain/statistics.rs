use std::collections::BTreeMap;

use crate::tracking::domain::frame_record::{FrameKey, FrameRecord};

/// Detection statistics derived from a set of frame records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunStatistics {
    pub total_frames: u64,
    pub frames_with_face: u64,
    /// `frames_with_face / total_frames`, 0 for an empty run.
    pub detection_rate: f64,
    /// Mean `num_landmarks` over all frames, 0 for an empty run.
    pub average_landmarks_per_frame: f64,
}

impl RunStatistics {
    pub fn from_records(frames: &BTreeMap<FrameKey, FrameRecord>) -> Self {
        let total_frames = frames.len() as u64;
        let frames_with_face = frames.values().filter(|r| r.has_face()).count() as u64;
        let landmark_sum: u64 = frames.values().map(|r| r.num_landmarks as u64).sum();
        Self {
            total_frames,
            frames_with_face,
            detection_rate: ratio(frames_with_face, total_frames),
            average_landmarks_per_frame: ratio(landmark_sum, total_frames),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
