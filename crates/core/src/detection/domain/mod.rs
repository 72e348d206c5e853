pub mod face_landmarks;
pub mod face_locator;
pub mod landmark_detector;
pub mod model_provider;
