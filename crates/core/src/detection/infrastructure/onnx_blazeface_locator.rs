/// BlazeFace face locator using ONNX Runtime via `ort`.
///
/// Finds the most confident face box so the mesh model can run on a crop
/// instead of the whole frame.
use std::path::Path;

use crate::detection::domain::face_locator::{FaceBox, FaceLocator};
use crate::detection::infrastructure::onnx_session::{
    build_session, model_input_geometry, sigmoid, InputLayout,
};
use crate::shared::frame::{ChannelOrder, Frame};

/// Short-range BlazeFace input resolution.
const DEFAULT_INPUT_SIZE: u32 = 128;

/// Default minimum detection probability.
pub const DEFAULT_MIN_DETECTION_SCORE: f64 = 0.5;

/// Values per anchor in the regressor output (box + 6 keypoints).
const REGRESSOR_STRIDE: usize = 16;

/// Raw logits are clipped to this magnitude before the sigmoid.
const SCORE_CLIP: f32 = 100.0;

/// Face locator backed by a BlazeFace ONNX session.
pub struct OnnxBlazefaceLocator {
    session: ort::session::Session,
    min_score: f64,
    input_size: u32,
    layout: InputLayout,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceLocator {
    /// Load a short-range BlazeFace ONNX model.
    pub fn new(model_path: &Path, min_score: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let (layout, input_size) =
            model_input_geometry(&session).unwrap_or((InputLayout::Nhwc, DEFAULT_INPUT_SIZE));
        let anchors = generate_anchors(input_size);
        log::debug!(
            "Loaded face detector {} ({layout:?}, {input_size}x{input_size}, {} anchors)",
            model_path.display(),
            anchors.len()
        );
        Ok(Self {
            session,
            min_score,
            input_size,
            layout,
            anchors,
        })
    }
}

impl FaceLocator for OnnxBlazefaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Option<FaceBox>, Box<dyn std::error::Error>> {
        if frame.order() != ChannelOrder::Rgb {
            return Err("face detector expects RGB frames".into());
        }

        let input_tensor = preprocess(frame, self.input_size, self.layout);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Regressors [1, N, 16] and scores [1, N, 1]; told apart by size
        let n = self.anchors.len();
        let mut regressors: Option<Vec<f32>> = None;
        let mut scores: Option<Vec<f32>> = None;
        for i in 0..outputs.len() {
            let array = outputs[i].try_extract_array::<f32>()?;
            let values: Vec<f32> = array.iter().copied().collect();
            if values.len() == n * REGRESSOR_STRIDE && regressors.is_none() {
                regressors = Some(values);
            } else if values.len() == n && scores.is_none() {
                scores = Some(values);
            }
        }
        let regressors = regressors.ok_or("face detector produced no box regressors")?;
        let scores = scores.ok_or("face detector produced no scores")?;

        Ok(best_box(
            &regressors,
            &scores,
            &self.anchors,
            self.input_size,
            self.min_score,
            frame.width(),
            frame.height(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize (nearest neighbour, no aspect correction) to `size × size`,
/// normalized to [-1, 1].
fn preprocess(frame: &Frame, size: u32, layout: InputLayout) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros(layout.shape(size));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                let value = src[[src_y, src_x, c]] as f32 / 127.5 - 1.0;
                layout.set(&mut tensor, y, x, c, value);
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchors and decoding
// ---------------------------------------------------------------------------

/// Anchor centres for the short-range model: a stride-8 grid with 2 anchors
/// per cell and a stride-16 grid with 6 (896 anchors at 128x128).
fn generate_anchors(input_size: u32) -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)];
    let mut anchors = Vec::new();

    for &(stride, num) in &strides {
        let grid_size = (input_size as usize).div_ceil(stride);
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Decodes the highest-scoring anchor into frame pixels, if it clears `min_score`.
fn best_box(
    regressors: &[f32],
    scores: &[f32],
    anchors: &[[f32; 2]],
    input_size: u32,
    min_score: f64,
    frame_width: u32,
    frame_height: u32,
) -> Option<FaceBox> {
    let (index, score) = scores
        .iter()
        .take(anchors.len())
        .enumerate()
        .map(|(i, &raw)| (i, sigmoid(raw.clamp(-SCORE_CLIP, SCORE_CLIP)) as f64))
        .filter(|&(i, score)| {
            score >= min_score && (i + 1) * REGRESSOR_STRIDE <= regressors.len()
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

    let anchor = anchors[index];
    let reg = &regressors[index * REGRESSOR_STRIDE..];
    let size = input_size as f32;
    let cx = anchor[0] + reg[0] / size;
    let cy = anchor[1] + reg[1] / size;
    let w = reg[2] / size;
    let h = reg[3] / size;
    if !(w > 0.0 && h > 0.0) {
        return None;
    }

    let fw = frame_width as f64;
    let fh = frame_height as f64;
    Some(FaceBox {
        x: (cx - w / 2.0) as f64 * fw,
        y: (cy - h / 2.0) as f64 * fh,
        width: w as f64 * fw,
        height: h as f64 * fh,
        score,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
