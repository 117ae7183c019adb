/// Gaussian sigma derived from the kernel size when none is given.
///
/// Same rule OpenCV applies for `sigma <= 0`.
pub fn auto_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Precompute a normalized 1D Gaussian kernel.
///
/// `kernel_size` must be odd and >= 1. A non-positive `sigma` falls back to
/// [`auto_sigma`].
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        auto_sigma(kernel_size)
    };
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Unit-weighted averaging kernel of the given length.
pub fn box_kernel_1d(length: usize) -> Vec<f32> {
    let length = length.max(1);
    vec![1.0 / length as f32; length]
}

/// The identity kernel: leaves an axis untouched.
pub fn identity_kernel() -> Vec<f32> {
    vec![1.0]
}

/// Convolve `data` with a horizontal then a vertical 1D kernel, reusing `temp`.
///
/// Samples past the buffer edges are clamped to the nearest edge pixel, so
/// nothing outside `data` is ever read.
pub fn separable_convolve(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    horizontal: &[f32],
    vertical: &[f32],
    temp: &mut Vec<f32>,
) {
    if (horizontal.len() <= 1 && vertical.len() <= 1) || width == 0 || height == 0 {
        return;
    }
    let half_h = horizontal.len() / 2;
    let half_v = vertical.len() / 2;

    let needed = width * height * channels;
    temp.resize(needed, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in horizontal.iter().enumerate() {
                    let sx = (x as isize + k as isize - half_h as isize)
                        .max(0)
                        .min((width - 1) as isize) as usize;
                    sum += data[(y * width + sx) * channels + c] as f32 * w;
                }
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in vertical.iter().enumerate() {
                    let sy = (y as isize + k as isize - half_v as isize)
                        .max(0)
                        .min((height - 1) as isize) as usize;
                    sum += temp[(sy * width + x) * channels + c] * w;
                }
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
