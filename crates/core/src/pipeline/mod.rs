pub mod extract_landmarks_use_case;
pub mod pipeline_logger;
pub mod tracking_error;
