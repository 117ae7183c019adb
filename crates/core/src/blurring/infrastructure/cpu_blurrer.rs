use std::cell::RefCell;

use crate::blurring::domain::blur_error::BlurError;
use crate::blurring::domain::blur_settings::{BlurMode, CustomSettings, MotionDirection};
use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::shared::constants::{HEAVY_KERNEL_SIZE, MOTION_KERNEL_LENGTH, SLIGHT_KERNEL_SIZE};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::convolution;

/// How the cropped sub-frame gets filtered.
#[derive(Clone, Debug, PartialEq)]
enum KernelPlan {
    /// Two 1D passes; Gaussian and motion blur both reduce to this.
    Separable {
        horizontal: Vec<f32>,
        vertical: Vec<f32>,
    },
    /// Gaussian parameterized by radius, delegated to `image::imageops::blur`.
    Radius(f32),
}

/// CPU blurrer for a single rectangular region.
///
/// Kernels are computed once at construction, so one instance can be reused
/// for every frame of a video.
pub struct CpuBlurrer {
    plan: KernelPlan,
    temp: RefCell<Vec<f32>>,
}

impl CpuBlurrer {
    pub fn new(mode: BlurMode, settings: &CustomSettings) -> Result<Self, BlurError> {
        let plan = match mode {
            BlurMode::Heavy => gaussian_plan(HEAVY_KERNEL_SIZE, 0.0),
            BlurMode::Slight => gaussian_plan(SLIGHT_KERNEL_SIZE, 0.0),
            BlurMode::Custom => gaussian_plan(settings.checked_ksize()?, settings.checked_sigma()?),
            BlurMode::Motion => {
                let taps = convolution::box_kernel_1d(MOTION_KERNEL_LENGTH);
                match settings.direction {
                    MotionDirection::Horizontal => KernelPlan::Separable {
                        horizontal: taps,
                        vertical: convolution::identity_kernel(),
                    },
                    MotionDirection::Vertical => KernelPlan::Separable {
                        horizontal: convolution::identity_kernel(),
                        vertical: taps,
                    },
                }
            }
            BlurMode::Radial => KernelPlan::Radius(settings.checked_radius()? as f32),
        };
        Ok(Self {
            plan,
            temp: RefCell::new(Vec::new()),
        })
    }

    fn blur_buffer(
        &self,
        buf: &mut Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<(), BlurError> {
        match &self.plan {
            KernelPlan::Separable {
                horizontal,
                vertical,
            } => {
                let mut temp = self.temp.borrow_mut();
                convolution::separable_convolve(
                    buf, width, height, channels, horizontal, vertical, &mut temp,
                );
                Ok(())
            }
            KernelPlan::Radius(radius) => {
                if *radius <= 0.0 {
                    return Ok(());
                }
                if channels != 3 {
                    return Err(BlurError::Kernel(format!(
                        "radius blur needs 3-channel pixels, got {channels}"
                    )));
                }
                let img = image::RgbImage::from_raw(width as u32, height as u32, std::mem::take(buf))
                    .ok_or_else(|| BlurError::Kernel("sub-frame buffer size mismatch".into()))?;
                *buf = image::imageops::blur(&img, *radius).into_raw();
                Ok(())
            }
        }
    }
}

fn gaussian_plan(kernel_size: usize, sigma: f64) -> KernelPlan {
    let kernel = convolution::gaussian_kernel_1d(kernel_size, sigma);
    KernelPlan::Separable {
        horizontal: kernel.clone(),
        vertical: kernel,
    }
}

impl FrameBlurrer for CpuBlurrer {
    fn blur(&self, frame: &Frame, region: &Region) -> Result<Frame, BlurError> {
        let roi = match region.validate(frame.width(), frame.height()) {
            Ok(roi) => roi,
            Err(e) => {
                log::error!("Invalid region {region:?}: {e}; frame left unmodified");
                return Ok(frame.clone());
            }
        };
        let rect = roi.bounds(frame.width(), frame.height());
        if rect.w == 0 || rect.h == 0 {
            return Ok(frame.clone());
        }

        // Work on a copy of the sub-frame so the source stays untouched.
        let mut section = frame.crop(&rect);
        self.blur_buffer(&mut section, rect.w, rect.h, frame.channels() as usize)?;
        frame
            .with_patch(&rect, &section)
            .map_err(|e| BlurError::Kernel(e.to_string()))
    }
}
