use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The area of a frame to blur.
///
/// `Whole` covers the entire frame. `Rect` is a pixel rectangle with its
/// origin at the top-left corner; it is unchecked until [`Region::validate`]
/// runs against concrete frame dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Whole,
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("region origin ({x}, {y}) is negative")]
    NegativeOrigin { x: i32, y: i32 },
    #[error("region size {width}x{height} is not positive")]
    NonPositiveSize { width: i32, height: i32 },
    #[error(
        "region ({x}, {y}, {width}x{height}) extends past frame {frame_width}x{frame_height}"
    )]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Pixel rectangle that is known to lie inside its frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Outcome of a successful [`Region::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Roi {
    WholeFrame,
    Rect(RoiRect),
}

impl Roi {
    /// Concrete bounds for a frame of the given size.
    pub fn bounds(&self, frame_width: u32, frame_height: u32) -> RoiRect {
        match *self {
            Roi::WholeFrame => RoiRect {
                x: 0,
                y: 0,
                w: frame_width as usize,
                h: frame_height as usize,
            },
            Roi::Rect(rect) => rect,
        }
    }
}

impl Region {
    pub fn rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        Region::Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from `[x, y, width, height]`; returns `None` for any
    /// other slice length.
    pub fn from_xywh(values: &[i32]) -> Option<Self> {
        match *values {
            [x, y, w, h] => Some(Region::rect(x, y, w, h)),
            _ => None,
        }
    }

    /// Checks the region against frame bounds.
    pub fn validate(&self, frame_width: u32, frame_height: u32) -> Result<Roi, RegionError> {
        let (x, y, width, height) = match *self {
            Region::Whole => return Ok(Roi::WholeFrame),
            Region::Rect {
                x,
                y,
                width,
                height,
            } => (x, y, width, height),
        };

        if x < 0 || y < 0 {
            return Err(RegionError::NegativeOrigin { x, y });
        }
        if width <= 0 || height <= 0 {
            return Err(RegionError::NonPositiveSize { width, height });
        }
        if i64::from(x) + i64::from(width) > i64::from(frame_width)
            || i64::from(y) + i64::from(height) > i64::from(frame_height)
        {
            return Err(RegionError::OutOfBounds {
                x,
                y,
                width,
                height,
                frame_width,
                frame_height,
            });
        }

        Ok(Roi::Rect(RoiRect {
            x: x as usize,
            y: y as usize,
            w: width as usize,
            h: height as usize,
        }))
    }
}
