use ndarray::ArrayView3;

/// Byte order of the three colour channels in a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A single decoded video/image frame: contiguous 3-channel bytes in row-major order.
///
/// Readers tag each frame with its channel order; detectors expect RGB, so the
/// pipeline calls [`Frame::into_rgb`] before handing a frame over.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
    index: usize,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            order,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Zero-based position of the frame in decode order, as assigned by the reader.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Swaps the first and third channel of every pixel when the frame is BGR.
    pub fn into_rgb(mut self) -> Self {
        if self.order == ChannelOrder::Bgr {
            for pixel in self.data.chunks_exact_mut(Self::CHANNELS) {
                pixel.swap(0, 2);
            }
            self.order = ChannelOrder::Rgb;
        }
        self
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, ChannelOrder::Rgb, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.order(), ChannelOrder::Rgb);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, ChannelOrder::Rgb, 0);
    }

    #[test]
    fn test_into_rgb_swaps_bgr_channels() {
        let data = vec![10, 20, 30, 40, 50, 60]; // 2x1 BGR
        let frame = Frame::new(data, 2, 1, ChannelOrder::Bgr, 0).into_rgb();
        assert_eq!(frame.order(), ChannelOrder::Rgb);
        assert_eq!(frame.data(), &[30, 20, 10, 60, 50, 40]);
    }

    #[test]
    fn test_into_rgb_leaves_rgb_untouched() {
        let data = vec![10, 20, 30];
        let frame = Frame::new(data.clone(), 1, 1, ChannelOrder::Rgb, 0).into_rgb();
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, ChannelOrder::Rgb, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}
