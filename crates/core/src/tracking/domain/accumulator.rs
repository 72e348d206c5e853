use std::collections::BTreeMap;

use crate::tracking::domain::frame_record::{FrameKey, FrameRecord, LandmarkPoint};
use crate::tracking::domain::run_metadata::RunMetadata;
use crate::tracking::domain::tracking_result::TrackingResult;

/// Per-run collector of frame records.
///
/// Numbers frames itself (1, 2, 3, ...) so the record set has no gaps or
/// duplicates no matter what the reader or detector did.
pub struct TrackingAccumulator {
    fps: f64,
    frames: BTreeMap<FrameKey, FrameRecord>,
    frames_with_face: u64,
}

impl TrackingAccumulator {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            frames: BTreeMap::new(),
            frames_with_face: 0,
        }
    }

    /// Number the next frame will receive.
    pub fn next_frame_number(&self) -> u64 {
        self.frames.len() as u64 + 1
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn push(&mut self, landmarks: Vec<LandmarkPoint>) -> &FrameRecord {
        let record = FrameRecord::new(self.next_frame_number(), self.fps, landmarks);
        if record.has_face() {
            self.frames_with_face += 1;
        }
        self.frames.entry(record.key()).or_insert(record)
    }

    pub fn finish(self, video_path: impl Into<String>) -> TrackingResult {
        let metadata = RunMetadata::new(
            video_path,
            self.frames.len() as u64,
            self.fps,
            self.frames_with_face,
        );
        TrackingResult {
            metadata,
            frames: self.frames,
        }
    }
}
