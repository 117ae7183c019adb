use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::blur_error::BlurError;
use crate::shared::constants::{MAX_BLUR_RADIUS, MAX_KERNEL_SIZE};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurMode {
    /// Large fixed Gaussian (51x51).
    #[default]
    Heavy,
    /// Small fixed Gaussian (15x15).
    Slight,
    /// Gaussian with caller-supplied `ksize` and `sigma`.
    Custom,
    /// 15-tap directional average.
    Motion,
    /// Gaussian parameterized by a radius taken from `angle`.
    Radial,
}

impl BlurMode {
    pub const ALL: &[BlurMode] = &[
        BlurMode::Heavy,
        BlurMode::Slight,
        BlurMode::Custom,
        BlurMode::Motion,
        BlurMode::Radial,
    ];
}

impl fmt::Display for BlurMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlurMode::Heavy => write!(f, "Heavy"),
            BlurMode::Slight => write!(f, "Slight"),
            BlurMode::Custom => write!(f, "Custom"),
            BlurMode::Motion => write!(f, "Motion"),
            BlurMode::Radial => write!(f, "Radial"),
        }
    }
}

impl FromStr for BlurMode {
    type Err = BlurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlurMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BlurError::UnsupportedMode(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionDirection {
    Horizontal,
    Vertical,
}

impl FromStr for MotionDirection {
    type Err = BlurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(MotionDirection::Horizontal),
            "vertical" => Ok(MotionDirection::Vertical),
            other => Err(BlurError::InvalidSettings(format!(
                "motion direction must be 'horizontal' or 'vertical', got '{other}'"
            ))),
        }
    }
}

/// Parameters read by the `Custom`, `Motion` and `Radial` modes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSettings {
    /// Gaussian kernel side length; forced odd and at least 1 before use,
    /// at most [`MAX_KERNEL_SIZE`].
    pub ksize: i32,
    /// Gaussian standard deviation; 0 derives it from `ksize`.
    pub sigma: f64,
    pub direction: MotionDirection,
    /// Blur radius for `Radial`, at most [`MAX_BLUR_RADIUS`]. Despite the
    /// name this is not a rotation.
    pub angle: f64,
}

impl Default for CustomSettings {
    fn default() -> Self {
        Self {
            ksize: 25,
            sigma: 5.0,
            direction: MotionDirection::Horizontal,
            angle: 45.0,
        }
    }
}

impl CustomSettings {
    /// `ksize` rounded up to the nearest odd value, minimum 1.
    pub fn odd_ksize(&self) -> usize {
        if self.ksize < 1 {
            1
        } else {
            (self.ksize as usize) | 1
        }
    }

    /// [`odd_ksize`](Self::odd_ksize), rejecting sizes above [`MAX_KERNEL_SIZE`].
    pub fn checked_ksize(&self) -> Result<usize, BlurError> {
        if self.ksize > MAX_KERNEL_SIZE {
            return Err(BlurError::InvalidSettings(format!(
                "ksize must be at most {MAX_KERNEL_SIZE}, got {}",
                self.ksize
            )));
        }
        Ok(self.odd_ksize())
    }

    pub fn checked_sigma(&self) -> Result<f64, BlurError> {
        if self.sigma.is_finite() && self.sigma >= 0.0 {
            Ok(self.sigma)
        } else {
            Err(BlurError::InvalidSettings(format!(
                "sigma must be a non-negative number, got {}",
                self.sigma
            )))
        }
    }

    pub fn checked_radius(&self) -> Result<f64, BlurError> {
        if self.angle.is_finite() && (0.0..=MAX_BLUR_RADIUS).contains(&self.angle) {
            Ok(self.angle)
        } else {
            Err(BlurError::InvalidSettings(format!(
                "angle (blur radius) must be between 0 and {MAX_BLUR_RADIUS}, got {}",
                self.angle
            )))
        }
    }
}
