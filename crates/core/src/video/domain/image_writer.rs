use std::path::Path;

use crate::shared::frame::Frame;

/// Encodes a single frame to an image file, replacing any existing file.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
