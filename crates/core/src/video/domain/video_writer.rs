use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Slice of a source file's audio to carry into the output, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub source: PathBuf,
    pub start: f64,
    pub end: f64,
}

/// Abstracts video encoding so the pipeline can write output without
/// depending on a specific codec library.
pub trait VideoWriter: Send {
    /// `audio` is muxed in on close when the source actually has an audio
    /// stream; a silent source is not an error.
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
        audio: Option<AudioClip>,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
