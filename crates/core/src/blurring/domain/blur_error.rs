use thiserror::Error;

/// Failure to produce a blurred frame. The input frame is never partially
/// modified when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlurError {
    #[error("unsupported blur mode: {0}")]
    UnsupportedMode(String),
    #[error("invalid blur settings: {0}")]
    InvalidSettings(String),
    #[error("blur kernel failed: {0}")]
    Kernel(String),
}
