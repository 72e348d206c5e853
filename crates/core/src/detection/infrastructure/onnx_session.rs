//! Session setup and tensor helpers shared by the ONNX detectors.

use std::path::Path;

use crate::detection::infrastructure::execution_provider::preferred_execution_providers;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputLayout {
    /// `[1, H, W, 3]`, the layout of converted TFLite models.
    Nhwc,
    /// `[1, 3, H, W]`
    Nchw,
}

impl InputLayout {
    pub(crate) fn shape(self, size: u32) -> (usize, usize, usize, usize) {
        let s = size as usize;
        match self {
            InputLayout::Nhwc => (1, s, s, 3),
            InputLayout::Nchw => (1, 3, s, s),
        }
    }

    pub(crate) fn set(self, tensor: &mut ndarray::Array4<f32>, y: usize, x: usize, c: usize, value: f32) {
        match self {
            InputLayout::Nhwc => tensor[[0, y, x, c]] = value,
            InputLayout::Nchw => tensor[[0, c, y, x]] = value,
        }
    }
}

pub(crate) fn build_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let session = ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Layout and square size of the session's first input, when declared.
pub(crate) fn model_input_geometry(session: &ort::session::Session) -> Option<(InputLayout, u32)> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            input_geometry(shape)
        } else {
            None
        }
    })
}

/// Reads layout and square input size from a 4-D input shape.
pub(crate) fn input_geometry(shape: &[i64]) -> Option<(InputLayout, u32)> {
    if shape.len() != 4 {
        return None;
    }
    if shape[1] == 3 && shape[2] > 0 {
        Some((InputLayout::Nchw, shape[2] as u32))
    } else if shape[3] == 3 && shape[1] > 0 {
        Some((InputLayout::Nhwc, shape[1] as u32))
    } else {
        None
    }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
