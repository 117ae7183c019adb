use ndarray::{s, ArrayView3, ArrayViewMut3, ShapeError};

use super::region::RoiRect;

/// Decoded pixels of one image or video frame, `height x width x channels`
/// bytes in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
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

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position in the source stream; 0 for still images.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `rect` into a packed `h x w x channels` buffer.
    ///
    /// `rect` must lie inside the frame.
    pub fn crop(&self, rect: &RoiRect) -> Vec<u8> {
        let RoiRect { x, y, w, h } = *rect;
        self.as_ndarray()
            .slice(s![y..y + h, x..x + w, ..])
            .iter()
            .copied()
            .collect()
    }

    /// A copy of this frame with `pixels` (as produced by [`Frame::crop`])
    /// written back over `rect`.
    pub fn with_patch(&self, rect: &RoiRect, pixels: &[u8]) -> Result<Frame, ShapeError> {
        let RoiRect { x, y, w, h } = *rect;
        let patch = ArrayView3::from_shape((h, w, self.channels as usize), pixels)?;
        let mut output = self.clone();
        output
            .as_ndarray_mut()
            .slice_mut(s![y..y + h, x..x + w, ..])
            .assign(&patch);
        Ok(output)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
