pub mod execution_provider;
pub mod model_resolver;
pub mod onnx_blazeface_locator;
pub mod onnx_face_mesh_detector;
pub(crate) mod onnx_session;
