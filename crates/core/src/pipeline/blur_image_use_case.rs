use std::path::{Path, PathBuf};

use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::pipeline::process_error::ProcessError;
use crate::shared::region::Region;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::image_writer::ImageWriter;

/// Single-image pipeline: read → blur → write back over the source.
pub struct BlurImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    blurrer: Box<dyn FrameBlurrer>,
    region: Region,
}

impl BlurImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        blurrer: Box<dyn FrameBlurrer>,
        region: Region,
    ) -> Self {
        Self {
            reader,
            writer,
            blurrer,
            region,
        }
    }

    /// Blurs the image at `path` in place and returns that same path.
    ///
    /// The source file is overwritten; no backup is kept. An invalid region
    /// leaves the pixels untouched but the file is still rewritten.
    pub fn execute(&self, path: &Path) -> Result<PathBuf, ProcessError> {
        let frame = self
            .reader
            .read(path)
            .map_err(|e| ProcessError::decode(path, e))?;

        let blurred = self
            .blurrer
            .blur(&frame, &self.region)
            .map_err(|source| ProcessError::Blur {
                path: path.to_path_buf(),
                source,
            })?;

        self.writer
            .write(path, &blurred)
            .map_err(|e| ProcessError::encode(path, e))?;

        log::debug!("Blurred image {}", path.display());
        Ok(path.to_path_buf())
    }
}
