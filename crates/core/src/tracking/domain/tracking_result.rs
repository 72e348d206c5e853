use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tracking::domain::frame_record::{FrameKey, FrameRecord};
use crate::tracking::domain::run_metadata::RunMetadata;
use crate::tracking::domain::statistics::RunStatistics;

/// Everything one run produced: summary metadata plus a record per decoded frame.
///
/// Built once at the end of a run and treated as read-only afterwards,
/// including after being reloaded from disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingResult {
    pub metadata: RunMetadata,
    pub frames: BTreeMap<FrameKey, FrameRecord>,
}

impl TrackingResult {
    pub fn frame(&self, frame_number: u64) -> Option<&FrameRecord> {
        self.frames.get(&FrameKey::new(frame_number))
    }

    pub fn statistics(&self) -> RunStatistics {
        RunStatistics::from_records(&self.frames)
    }

    /// Checks the invariants every finished run satisfies: frames numbered
    /// `1..=total_frames` under matching keys, `num_landmarks` equal to the
    /// landmark count, and metadata counts that agree with the records.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (expected, (key, record)) in (1u64..).zip(&self.frames) {
            if key.frame_number() != record.frame_number {
                return Err(format!(
                    "key {key} holds frame_number {}",
                    record.frame_number
                ));
            }
            if key.frame_number() != expected {
                return Err(format!(
                    "frame numbers are not contiguous: expected {}, found {key}",
                    FrameKey::new(expected)
                ));
            }
            if record.num_landmarks != record.landmarks.len() {
                return Err(format!(
                    "frame {key}: num_landmarks is {} but {} landmarks are listed",
                    record.num_landmarks,
                    record.landmarks.len()
                ));
            }
        }

        let stats = self.statistics();
        if self.metadata.total_frames != stats.total_frames {
            return Err(format!(
                "metadata declares {} frames but {} records are present",
                self.metadata.total_frames, stats.total_frames
            ));
        }
        if self.metadata.frames_with_face != stats.frames_with_face {
            return Err(format!(
                "metadata declares {} frames with a face but the records hold {}",
                self.metadata.frames_with_face, stats.frames_with_face
            ));
        }
        Ok(())
    }

    /// Finds the first NaN or infinite number, which JSON cannot represent.
    pub fn check_finite(&self) -> Result<(), String> {
        if !self.metadata.fps.is_finite() {
            return Err(format!("fps is {}", self.metadata.fps));
        }
        if !self.metadata.duration_seconds.is_finite() {
            return Err(format!(
                "duration_seconds is {}",
                self.metadata.duration_seconds
            ));
        }
        for (key, record) in &self.frames {
            if !record.timestamp.is_finite() {
                return Err(format!("frame {key}: timestamp is {}", record.timestamp));
            }
            if let Some((i, point)) = record
                .landmarks
                .iter()
                .enumerate()
                .find(|(_, p)| !p.x.is_finite() || !p.y.is_finite())
            {
                return Err(format!(
                    "frame {key}: landmark {i} is ({}, {})",
                    point.x, point.y
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::domain::frame_record::LandmarkPoint;

    fn result() -> TrackingResult {
        let frames = [
            FrameRecord::new(1, 30.0, vec![LandmarkPoint::new(1.0, 2.0)]),
            FrameRecord::new(2, 30.0, Vec::new()),
        ]
        .into_iter()
        .map(|r| (r.key(), r))
        .collect();
        TrackingResult {
            metadata: RunMetadata::new("a.mp4", 2, 30.0, 1),
            frames,
        }
    }

    #[test]
    fn test_frame_lookup() {
        let result = result();
        assert_eq!(result.frame(1).unwrap().num_landmarks, 1);
        assert!(result.frame(2).unwrap().landmarks.is_empty());
        assert!(result.frame(3).is_none());
        assert!(result.frame(0).is_none());
    }

    #[test]
    fn test_statistics() {
        let stats = result().statistics();
        assert_eq!(stats.total_frames, 2);
        assert_eq!(stats.frames_with_face, 1);
        assert_eq!(stats.detection_rate, 0.5);
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(result()).unwrap();
        assert_eq!(value["metadata"]["total_frames"], 2);
        assert_eq!(value["metadata"]["video_path"], "a.mp4");
        assert_eq!(value["frames"]["00000001"]["frame_number"], 1);
        assert_eq!(value["frames"]["00000002"]["num_landmarks"], 0);
    }

    #[test]
    fn test_finished_run_is_consistent() {
        assert!(result().check_consistency().is_ok());
    }

    #[test]
    fn test_gap_in_frame_numbers_is_inconsistent() {
        let mut result = result();
        let second = result.frames.remove(&FrameKey::new(2)).unwrap();
        let moved = FrameRecord::new(5, 30.0, second.landmarks);
        result.frames.insert(moved.key(), moved);

        let reason = result.check_consistency().unwrap_err();

        assert!(reason.contains("00000005"));
    }

    #[test]
    fn test_key_not_matching_frame_number_is_inconsistent() {
        let mut result = result();
        let first = result.frames.remove(&FrameKey::new(1)).unwrap();
        result.frames.insert(FrameKey::new(3), first);
        assert!(result.check_consistency().is_err());
    }

    #[test]
    fn test_declared_total_must_match_records() {
        let mut result = result();
        result.metadata.total_frames = 3;
        assert!(result.check_consistency().unwrap_err().contains("3 frames"));
    }

    #[test]
    fn test_declared_face_count_must_match_records() {
        let mut result = result();
        result.metadata.frames_with_face = 2;
        assert!(result.check_consistency().is_err());
    }

    #[test]
    fn test_landmark_count_must_match_list() {
        let mut result = result();
        result.frames.get_mut(&FrameKey::new(1)).unwrap().num_landmarks = 2;
        assert!(result.check_consistency().is_err());
    }

    #[test]
    fn test_finite_result_passes() {
        assert!(result().check_finite().is_ok());
    }

    #[test]
    fn test_nan_landmark_is_reported() {
        let mut result = result();
        result.frames.get_mut(&FrameKey::new(1)).unwrap().landmarks[0] =
            LandmarkPoint::new(f64::NAN, 1.0);
        assert!(result.check_finite().unwrap_err().contains("landmark 0"));
    }

    #[test]
    fn test_infinite_fps_is_reported() {
        let mut result = result();
        result.metadata.fps = f64::INFINITY;
        assert!(result.check_finite().is_err());
    }
}
