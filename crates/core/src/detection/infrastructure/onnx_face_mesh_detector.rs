/// 468-point face mesh detector using ONNX Runtime via `ort`.
///
/// Two stages: a [`FaceLocator`] finds the face, then the mesh model runs on
/// a square crop around it, enlarged so the whole head fits. The model's
/// face-presence score decides between "face" and "no face".
use std::path::Path;

use crate::detection::domain::face_landmarks::{FaceMesh, NormalizedLandmark};
use crate::detection::domain::face_locator::{FaceBox, FaceLocator};
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::infrastructure::onnx_session::{
    build_session, model_input_geometry, sigmoid, InputLayout,
};
use crate::shared::frame::{ChannelOrder, Frame};

/// Fallback input resolution when the model doesn't declare one.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Default minimum face-presence probability.
pub const DEFAULT_MIN_FACE_SCORE: f64 = 0.5;

/// Crop side relative to the longer side of the detected face box.
const ROI_SCALE: f64 = 1.5;

/// Values per landmark in the model output (x, y, z).
const VALUES_PER_LANDMARK: usize = 3;

/// Landmarks in the canonical face mesh topology.
pub const NUM_LANDMARKS: usize = 468;

/// Face mesh detector backed by an ONNX Runtime session.
pub struct OnnxFaceMeshDetector {
    session: ort::session::Session,
    locator: Box<dyn FaceLocator>,
    min_face_score: f64,
    input_size: u32,
    layout: InputLayout,
}

impl OnnxFaceMeshDetector {
    /// Load a face mesh ONNX model that runs on faces found by `locator`.
    ///
    /// Input layout and resolution are read from the model's first input;
    /// falls back to NHWC 192x192 when the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        locator: Box<dyn FaceLocator>,
        min_face_score: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let (layout, input_size) =
            model_input_geometry(&session).unwrap_or((InputLayout::Nhwc, DEFAULT_INPUT_SIZE));

        log::debug!(
            "Loaded face mesh model {} ({layout:?}, {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            locator,
            min_face_score,
            input_size,
            layout,
        })
    }
}

impl LandmarkDetector for OnnxFaceMeshDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<FaceMesh>, Box<dyn std::error::Error>> {
        if frame.order() != ChannelOrder::Rgb {
            return Err("face mesh model expects RGB frames".into());
        }

        let Some(face) = self.locator.locate(frame)? else {
            return Ok(None);
        };
        let roi = Roi::around(&face, ROI_SCALE);
        let input_tensor = crop_to_input(frame, &roi, self.input_size, self.layout);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let mut raw_landmarks: Option<Vec<f32>> = None;
        let mut face_logit: Option<f32> = None;
        for i in 0..outputs.len() {
            let array = outputs[i].try_extract_array::<f32>()?;
            let values: Vec<f32> = array.iter().copied().collect();
            if values.len() >= NUM_LANDMARKS * VALUES_PER_LANDMARK && raw_landmarks.is_none() {
                raw_landmarks = Some(values);
            } else if values.len() == 1 && face_logit.is_none() {
                face_logit = Some(values[0]);
            }
        }

        let raw = raw_landmarks.ok_or("face mesh model produced no landmark tensor")?;

        if let Some(logit) = face_logit {
            let score = sigmoid(logit) as f64;
            if score < self.min_face_score {
                log::trace!("Frame {}: face score {score:.3} below threshold", frame.index());
                return Ok(None);
            }
        }

        let mesh = decode_landmarks(&raw, &roi, self.input_size, frame.width(), frame.height());
        if !mesh.is_finite() {
            return Err(format!(
                "face mesh model produced non-finite landmarks on frame {}",
                frame.index()
            )
            .into());
        }
        Ok(Some(mesh))
    }
}

// ---------------------------------------------------------------------------
// Region of interest
// ---------------------------------------------------------------------------

/// Square crop in frame pixels; may extend past the frame edges.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Roi {
    x: f64,
    y: f64,
    size: f64,
}

impl Roi {
    fn around(face: &FaceBox, scale: f64) -> Self {
        let (cx, cy) = face.center();
        let size = face.width.max(face.height) * scale;
        Self {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            size,
        }
    }
}

/// Sample the crop (nearest neighbour) into the model input, normalized to
/// [0,1]. Pixels outside the frame stay black.
fn crop_to_input(frame: &Frame, roi: &Roi, target_size: u32, layout: InputLayout) -> ndarray::Array4<f32> {
    let mut tensor = ndarray::Array4::<f32>::zeros(layout.shape(target_size));

    let src = frame.as_ndarray();
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let s = target_size as usize;
    let step = roi.size / target_size as f64;

    for ty in 0..s {
        let fy = roi.y + (ty as f64 + 0.5) * step;
        if fy < 0.0 || fy >= fh {
            continue;
        }
        for tx in 0..s {
            let fx = roi.x + (tx as f64 + 0.5) * step;
            if fx < 0.0 || fx >= fw {
                continue;
            }
            for c in 0..3 {
                let value = src[[fy as usize, fx as usize, c]] as f32 / 255.0;
                layout.set(&mut tensor, ty, tx, c, value);
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Maps model-space `(x, y, z)` triples back through the crop to
/// frame-normalized coordinates.
///
/// Extra values past the canonical mesh (e.g. iris refinements) are dropped.
fn decode_landmarks(raw: &[f32], roi: &Roi, input_size: u32, frame_width: u32, frame_height: u32) -> FaceMesh {
    let fw = frame_width as f64;
    let fh = frame_height as f64;
    let scale = roi.size / input_size as f64;
    let points = raw
        .chunks_exact(VALUES_PER_LANDMARK)
        .take(NUM_LANDMARKS)
        .map(|xyz| {
            let px = roi.x + xyz[0] as f64 * scale;
            let py = roi.y + xyz[1] as f64 * scale;
            NormalizedLandmark::new(px / fw, py / fh)
        })
        .collect();
    FaceMesh::new(points)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
