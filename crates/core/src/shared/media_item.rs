use std::path::{Path, PathBuf};

use super::constants::IMAGE_EXTENSIONS;
use super::time_window::TimeWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies by file extension. Anything that is not a known image
    /// extension is treated as video and left to the decoder.
    pub fn from_path(path: &Path) -> Self {
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            MediaKind::Image
        } else {
            MediaKind::Video
        }
    }
}

/// One file submitted to a batch. Consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Only meaningful for videos; always `None` for images.
    pub window: Option<TimeWindow>,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>, window: TimeWindow) -> Self {
        let path = path.into();
        let kind = MediaKind::from_path(&path);
        let window = match kind {
            MediaKind::Image => None,
            MediaKind::Video => Some(window),
        };
        Self { path, kind, window }
    }
}
