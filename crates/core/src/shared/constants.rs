pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "output/";

pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Gaussian kernel side length for [`BlurMode::Heavy`](crate::blurring::domain::blur_settings::BlurMode).
pub const HEAVY_KERNEL_SIZE: usize = 51;

/// Gaussian kernel side length for [`BlurMode::Slight`](crate::blurring::domain::blur_settings::BlurMode).
pub const SLIGHT_KERNEL_SIZE: usize = 15;

/// Length of the averaging kernel used for motion blur.
pub const MOTION_KERNEL_LENGTH: usize = 15;

/// Largest accepted `ksize` for custom Gaussian blur.
pub const MAX_KERNEL_SIZE: i32 = 255;

/// Largest accepted radius for radial blur.
pub const MAX_BLUR_RADIUS: f64 = 100.0;
