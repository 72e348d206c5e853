/// MediaPipe 468-point face landmark model converted to ONNX (192x192 RGB input).
pub const FACE_MESH_MODEL_NAME: &str = "face_mesh_468.onnx";

/// MediaPipe short-range BlazeFace detector converted to ONNX (128x128 RGB input).
pub const FACE_DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// Directory next to the executable searched for models shipped with a release.
pub const BUNDLED_MODEL_DIR: &str = "models";

/// Directory under the platform cache dir where models are stored.
pub const MODEL_CACHE_APP_DIR: &str = "FaceLandmarks";

/// Digits in a persisted frame key; 8 keeps keys fixed-width past a million frames.
pub const FRAME_KEY_WIDTH: usize = 8;

/// Frames between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 30;

pub const DEFAULT_INPUT_PATH: &str = "./video.mp4";
pub const DEFAULT_OUTPUT_PATH: &str = "video_landmarks.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
