use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a still image into a single RGB frame.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
