use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::blurring::domain::blur_error::BlurError;
use crate::shared::time_window::WindowError;

/// Why a single media item produced no output.
///
/// Codec failures are flattened to strings so the error can travel back from
/// a worker thread.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error("failed to blur {path}: {source}")]
    Blur { path: PathBuf, source: BlurError },
    #[error("invalid time window for {path}: {source}")]
    Window { path: PathBuf, source: WindowError },
    #[error("{path} has no file name")]
    InvalidPath { path: PathBuf },
    #[error("worker panicked while processing {path}: {message}")]
    Panicked { path: PathBuf, message: String },
}

impl ProcessError {
    pub fn decode(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn encode(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// The file the failing operation was working on.
    pub fn path(&self) -> &Path {
        match self {
            Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Blur { path, .. }
            | Self::Window { path, .. }
            | Self::InvalidPath { path }
            | Self::Panicked { path, .. } => path,
        }
    }

    /// Short operation label used in log lines.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Blur { .. } => "blur",
            Self::Window { .. } => "window",
            Self::InvalidPath { .. } => "resolve output",
            Self::Panicked { .. } => "process",
        }
    }
}
