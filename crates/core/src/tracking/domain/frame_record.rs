use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::shared::constants::FRAME_KEY_WIDTH;

/// Absolute pixel position of one landmark. Persisted as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for LandmarkPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<LandmarkPoint> for [f64; 2] {
    fn from(p: LandmarkPoint) -> Self {
        [p.x, p.y]
    }
}

/// Key of a frame in the persisted `frames` mapping.
///
/// Encoded as the frame number in decimal, left-padded with zeros to
/// [`FRAME_KEY_WIDTH`] digits (`42` -> `"00000042"`). Numbers wider than that
/// are written in full, so keys never collide. Keys compare numerically, so
/// ordering never depends on the padding. Deserialization only accepts this
/// canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameKey(u64);

impl FrameKey {
    pub fn new(frame_number: u64) -> Self {
        Self(frame_number)
    }

    pub fn frame_number(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = FRAME_KEY_WIDTH)
    }
}

impl FromStr for FrameKey {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl Serialize for FrameKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FrameKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(serde::de::Error::custom(format!(
                "frame key must be decimal digits, got {s:?}"
            )));
        }
        let key: FrameKey = s.parse().map_err(serde::de::Error::custom)?;
        // "1" and "00000001" would land on the same map entry
        if key.to_string() != s {
            return Err(serde::de::Error::custom(format!(
                "frame key {s:?} is not in canonical form \"{key}\""
            )));
        }
        Ok(key)
    }
}

/// Detection outcome for one decoded frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// 1-based position in decode order.
    pub frame_number: u64,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    pub landmarks: Vec<LandmarkPoint>,
    /// Always `landmarks.len()`.
    pub num_landmarks: usize,
}

impl FrameRecord {
    pub fn new(frame_number: u64, fps: f64, landmarks: Vec<LandmarkPoint>) -> Self {
        Self {
            frame_number,
            timestamp: timestamp_for(frame_number, fps),
            num_landmarks: landmarks.len(),
            landmarks,
        }
    }

    pub fn key(&self) -> FrameKey {
        FrameKey::new(self.frame_number)
    }

    pub fn has_face(&self) -> bool {
        self.num_landmarks > 0
    }
}

/// `frame_number / fps`, or 0 when the container reports no usable rate.
pub fn timestamp_for(frame_number: u64, fps: f64) -> f64 {
    if fps > 0.0 && fps.is_finite() {
        frame_number as f64 / fps
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, "00000001")]
    #[case(42, "00000042")]
    #[case(420, "00000420")]
    #[case(99_999_999, "99999999")]
    #[case(123_456_789, "123456789")]
    fn test_frame_key_encoding(#[case] n: u64, #[case] expected: &str) {
        assert_eq!(FrameKey::new(n).to_string(), expected);
    }

    #[test]
    fn test_frame_key_distinguishes_prefixes() {
        assert_ne!(FrameKey::new(42).to_string(), FrameKey::new(420).to_string());
        assert_eq!(FrameKey::new(42).to_string().len(), FrameKey::new(420).to_string().len());
    }

    #[test]
    fn test_frame_key_orders_numerically_past_width() {
        assert!(FrameKey::new(99_999_999) < FrameKey::new(100_000_000));
    }

    #[test]
    fn test_frame_key_parses_padded_and_unpadded() {
        assert_eq!("00000042".parse::<FrameKey>().unwrap(), FrameKey::new(42));
        assert_eq!("42".parse::<FrameKey>().unwrap(), FrameKey::new(42));
    }

    #[rstest]
    #[case::empty("\"\"")]
    #[case::signed("\"+42\"")]
    #[case::alpha("\"frame42\"")]
    fn test_frame_key_rejects_non_digits(#[case] json: &str) {
        assert!(serde_json::from_str::<FrameKey>(json).is_err());
    }

    #[rstest]
    #[case::unpadded("\"1\"")]
    #[case::over_padded("\"000000001\"")]
    #[case::short_padding("\"0042\"")]
    fn test_frame_key_rejects_non_canonical(#[case] json: &str) {
        assert!(serde_json::from_str::<FrameKey>(json).is_err());
    }

    #[rstest]
    #[case("\"00000042\"", 42)]
    #[case("\"123456789\"", 123_456_789)]
    fn test_frame_key_accepts_canonical(#[case] json: &str, #[case] n: u64) {
        assert_eq!(serde_json::from_str::<FrameKey>(json).unwrap(), FrameKey::new(n));
    }

    #[test]
    fn test_record_counts_landmarks() {
        let record = FrameRecord::new(3, 30.0, vec![LandmarkPoint::new(1.0, 2.0); 468]);
        assert_eq!(record.num_landmarks, 468);
        assert!(record.has_face());
    }

    #[test]
    fn test_record_without_landmarks() {
        let record = FrameRecord::new(2, 30.0, Vec::new());
        assert_eq!(record.num_landmarks, 0);
        assert!(record.landmarks.is_empty());
        assert!(!record.has_face());
    }

    #[test]
    fn test_record_timestamp() {
        let record = FrameRecord::new(45, 30.0, Vec::new());
        assert_relative_eq!(record.timestamp, 1.5);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-25.0)]
    #[case::nan(f64::NAN)]
    fn test_timestamp_without_usable_fps_is_zero(#[case] fps: f64) {
        assert_eq!(timestamp_for(10, fps), 0.0);
    }

    #[test]
    fn test_landmark_point_serializes_as_pair() {
        let json = serde_json::to_string(&LandmarkPoint::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");
    }

    #[test]
    fn test_record_json_field_names() {
        let record = FrameRecord::new(1, 25.0, vec![LandmarkPoint::new(10.0, 20.0)]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["frame_number"], 1);
        assert_eq!(value["num_landmarks"], 1);
        assert_eq!(value["landmarks"][0][1], 20.0);
        assert_relative_eq!(value["timestamp"].as_f64().unwrap(), 0.04);
    }
}
