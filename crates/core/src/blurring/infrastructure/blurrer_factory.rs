use crate::blurring::domain::blur_error::BlurError;
use crate::blurring::domain::blur_settings::{BlurMode, CustomSettings};
use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::cpu_blurrer::CpuBlurrer;

/// Creates a blurrer for the given mode, validating the settings it reads.
pub fn create_blurrer(
    mode: BlurMode,
    settings: &CustomSettings,
) -> Result<Box<dyn FrameBlurrer>, BlurError> {
    log::debug!("Creating CPU blurrer for {mode} mode ({settings:?})");
    Ok(Box::new(CpuBlurrer::new(mode, settings)?))
}

/// One-shot blur of `region` within `frame`.
///
/// Returns a new frame; `frame` itself is never modified. An invalid region
/// yields an unmodified copy and is logged rather than returned as an error.
pub fn apply_blur(
    frame: &Frame,
    region: &Region,
    mode: BlurMode,
    settings: &CustomSettings,
) -> Result<Frame, BlurError> {
    create_blurrer(mode, settings)?.blur(frame, region)
}
