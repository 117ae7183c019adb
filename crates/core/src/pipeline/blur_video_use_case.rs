use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::pipeline::process_error::ProcessError;
use crate::shared::region::Region;
use crate::shared::time_window::TimeWindow;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::{AudioClip, VideoWriter};

/// Video pipeline: read → cut to the time window → blur every frame → write.
///
/// Frames outside the window are dropped from the output, not passed through.
pub struct BlurVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    blurrer: Box<dyn FrameBlurrer>,
    region: Region,
}

impl BlurVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
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

    /// Writes the blurred clip to `output_dir/<input file name>`.
    ///
    /// Nothing is left at the output path when this returns an error.
    pub fn execute(
        &mut self,
        input: &Path,
        window: &TimeWindow,
        output_dir: &Path,
    ) -> Result<PathBuf, ProcessError> {
        let file_name = input.file_name().ok_or_else(|| ProcessError::InvalidPath {
            path: input.to_path_buf(),
        })?;
        let output = output_dir.join(file_name);
        if output == input {
            return Err(ProcessError::encode(
                input,
                "output directory is the source directory; refusing to overwrite the input",
            ));
        }

        let metadata = self
            .reader
            .open(input)
            .map_err(|e| ProcessError::decode(input, e))?;

        let result = self.transcode(input, window, &output, &metadata);
        self.reader.close();
        result.map(|frames| {
            log::info!(
                "Wrote {frames} frames from {} to {}",
                input.display(),
                output.display()
            );
            output
        })
    }

    fn transcode(
        &mut self,
        input: &Path,
        window: &TimeWindow,
        output: &Path,
        metadata: &VideoMetadata,
    ) -> Result<usize, ProcessError> {
        let window_err = |source| ProcessError::Window {
            path: input.to_path_buf(),
            source,
        };
        let resolved = window
            .resolve(metadata.effective_duration())
            .map_err(window_err)?;
        let range = resolved.frame_range(metadata.fps).map_err(window_err)?;

        let blur_frames = match self.region.validate(metadata.width, metadata.height) {
            Ok(_) => true,
            Err(e) => {
                log::error!(
                    "Invalid region for {}: {e}; writing frames unmodified",
                    input.display()
                );
                false
            }
        };

        let audio = AudioClip {
            source: input.to_path_buf(),
            start: resolved.start,
            end: if resolved.full {
                f64::INFINITY
            } else {
                resolved.end
            },
        };
        self.writer
            .open(output, metadata, Some(audio))
            .map_err(|e| ProcessError::encode(output, e))?;

        let written = self
            .write_window(input, output, range, blur_frames)
            .and_then(|written| {
                self.writer
                    .close()
                    .map_err(|e| ProcessError::encode(output, e))?;
                Ok(written)
            });

        match written {
            Ok(0) => {
                remove_partial(output);
                Err(ProcessError::encode(
                    output,
                    "no frames fell inside the time window",
                ))
            }
            Ok(n) => Ok(n),
            Err(e) => {
                let _ = self.writer.close();
                remove_partial(output);
                Err(e)
            }
        }
    }

    fn write_window(
        &mut self,
        input: &Path,
        output: &Path,
        range: Range<usize>,
        blur_frames: bool,
    ) -> Result<usize, ProcessError> {
        let mut written = 0;
        for frame_result in self.reader.frames() {
            let frame = frame_result.map_err(|e| ProcessError::decode(input, e))?;
            let index = frame.index();
            if index < range.start {
                continue;
            }
            if index >= range.end {
                break;
            }

            let frame = if blur_frames {
                self.blurrer
                    .blur(&frame, &self.region)
                    .map_err(|source| ProcessError::Blur {
                        path: input.to_path_buf(),
                        source,
                    })?
            } else {
                frame
            };

            self.writer
                .write(&frame)
                .map_err(|e| ProcessError::encode(output, e))?;
            written += 1;
        }
        Ok(written)
    }
}

fn remove_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            log::warn!("Could not remove partial output {}: {e}", output.display());
        }
    }
}
