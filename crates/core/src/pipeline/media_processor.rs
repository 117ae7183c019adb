use std::path::{Path, PathBuf};

use crate::blurring::domain::blur_settings::{BlurMode, CustomSettings};
use crate::blurring::infrastructure::blurrer_factory::create_blurrer;
use crate::pipeline::blur_image_use_case::BlurImageUseCase;
use crate::pipeline::blur_video_use_case::BlurVideoUseCase;
use crate::pipeline::process_error::ProcessError;
use crate::shared::constants::VIDEO_EXTENSIONS;
use crate::shared::media_item::{MediaItem, MediaKind};
use crate::shared::region::Region;
use crate::shared::time_window::TimeWindow;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use crate::video::infrastructure::image_file_reader::ImageFileReader;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// What to do to every item of a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlurJob {
    pub region: Region,
    pub mode: BlurMode,
    pub settings: CustomSettings,
    /// Applied to videos only.
    pub window: TimeWindow,
}

/// Turns one media item into one output file.
///
/// Implementations are shared across worker threads and must not keep
/// per-item mutable state.
pub trait MediaProcessor: Send + Sync {
    fn process(&self, item: &MediaItem, job: &BlurJob) -> Result<PathBuf, ProcessError>;
}

/// Processes files on disk with the ffmpeg and `image` codec backends.
///
/// Images are rewritten in place; videos go to `output_dir`.
pub struct FileMediaProcessor {
    output_dir: PathBuf,
}

impl FileMediaProcessor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl MediaProcessor for FileMediaProcessor {
    fn process(&self, item: &MediaItem, job: &BlurJob) -> Result<PathBuf, ProcessError> {
        let blurrer = create_blurrer(job.mode, &job.settings).map_err(|source| {
            ProcessError::Blur {
                path: item.path.clone(),
                source,
            }
        })?;

        match item.kind {
            MediaKind::Image => BlurImageUseCase::new(
                Box::new(ImageFileReader::new()),
                Box::new(ImageFileWriter::new()),
                blurrer,
                job.region,
            )
            .execute(&item.path),
            MediaKind::Video => {
                if !has_video_extension(&item.path) {
                    log::debug!(
                        "{} has no known video extension; letting the decoder decide",
                        item.path.display()
                    );
                }
                let window = item.window.unwrap_or(job.window);
                BlurVideoUseCase::new(
                    Box::new(FfmpegReader::new()),
                    Box::new(FfmpegWriter::new()),
                    blurrer,
                    job.region,
                )
                .execute(&item.path, &window, &self.output_dir)
            }
        }
    }
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::ffmpeg_reader::test_support::create_test_video;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 9 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_image_is_blurred_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 64, 48);
        let before = image::open(&path).unwrap().to_rgb8();

        let processor = FileMediaProcessor::new(dir.path().join("output"));
        let job = BlurJob {
            region: Region::rect(8, 8, 32, 24),
            ..BlurJob::default()
        };
        let out = processor
            .process(&MediaItem::new(&path, TimeWindow::default()), &job)
            .unwrap();

        assert_eq!(out, path);
        let after = image::open(&path).unwrap().to_rgb8();
        assert_eq!(after.dimensions(), (64, 48));
        assert_eq!(after.get_pixel(0, 0), before.get_pixel(0, 0));
        assert_ne!(after.get_pixel(20, 20), before.get_pixel(20, 20));
    }

    #[test]
    fn test_missing_image_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let processor = FileMediaProcessor::new(dir.path());
        let item = MediaItem::new(dir.path().join("nope.jpg"), TimeWindow::default());

        let err = processor.process(&item, &BlurJob::default()).unwrap_err();
        assert!(matches!(err, ProcessError::Decode { .. }));
    }

    #[test]
    fn test_invalid_settings_fail_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let processor = FileMediaProcessor::new(dir.path());
        let item = MediaItem::new(dir.path().join("nope.jpg"), TimeWindow::default());
        let job = BlurJob {
            mode: BlurMode::Radial,
            settings: CustomSettings {
                angle: -3.0,
                ..CustomSettings::default()
            },
            ..BlurJob::default()
        };

        let err = processor.process(&item, &job).unwrap_err();
        assert!(matches!(err, ProcessError::Blur { .. }));
    }

    #[test]
    fn test_video_goes_to_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        create_test_video(&input, 10, 160, 120, 30);
        let output_dir = dir.path().join("output");

        let processor = FileMediaProcessor::new(&output_dir);
        let out = processor
            .process(
                &MediaItem::new(&input, TimeWindow::default()),
                &BlurJob::default(),
            )
            .unwrap();

        assert_eq!(out, output_dir.join("clip.mp4"));
        assert!(out.exists());
        assert!(input.exists());
    }

    #[test]
    fn test_unknown_extension_is_tried_as_video() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"plain text").unwrap();

        let processor = FileMediaProcessor::new(dir.path().join("output"));
        let err = processor
            .process(&MediaItem::new(&input, TimeWindow::default()), &BlurJob::default())
            .unwrap_err();

        assert!(matches!(err, ProcessError::Decode { .. }));
        assert!(!dir.path().join("output").join("notes.txt").exists());
    }
}
