use crate::shared::frame::Frame;

/// Axis-aligned face box in frame pixels.
///
/// May extend past the frame edges; the landmark stage crops with padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub score: f64,
}

impl FaceBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Finds the single most confident face in an RGB frame.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Option<FaceBox>, Box<dyn std::error::Error>>;
}
