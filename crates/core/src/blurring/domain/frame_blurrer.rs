use crate::blurring::domain::blur_error::BlurError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for blurring one region of a frame.
///
/// Implementations return a new frame and leave the input untouched. An
/// invalid region is not an error: the result is an unmodified copy.
pub trait FrameBlurrer: Send {
    fn blur(&self, frame: &Frame, region: &Region) -> Result<Frame, BlurError>;
}
