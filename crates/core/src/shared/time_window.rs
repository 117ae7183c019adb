use std::ops::Range;

use thiserror::Error;

/// Requested `[start, end)` span of a video, in seconds.
///
/// `end = None` means "until the end of the clip".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: Option<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("start time {0} must be a non-negative number")]
    NegativeStart(f64),
    #[error("end time {end} must be a finite time after start time {start}")]
    EmptyWindow { start: f64, end: f64 },
    #[error("start time {start} is at or past the clip duration {duration}")]
    StartPastEnd { start: f64, duration: f64 },
    #[error("cannot cut a time window from a stream with unknown frame rate")]
    UnknownFrameRate,
}

/// A [`TimeWindow`] checked against a concrete clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedWindow {
    pub start: f64,
    pub end: f64,
    /// True when the window spans the whole clip and no cutting is needed.
    pub full: bool,
}

impl TimeWindow {
    pub fn new(start: f64, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// Resolves the window against a clip duration in seconds.
    ///
    /// A non-positive `duration` is treated as unknown: the window is then
    /// taken as given. An `end` past a known duration is clamped.
    pub fn resolve(&self, duration: f64) -> Result<ResolvedWindow, WindowError> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(WindowError::NegativeStart(self.start));
        }
        if let Some(end) = self.end.filter(|end| !end.is_finite()) {
            return Err(WindowError::EmptyWindow {
                start: self.start,
                end,
            });
        }
        let known = duration.is_finite() && duration > 0.0;
        if known && self.start >= duration {
            return Err(WindowError::StartPastEnd {
                start: self.start,
                duration,
            });
        }

        let end = match (self.end, known) {
            (Some(end), true) => end.min(duration),
            (Some(end), false) => end,
            (None, true) => duration,
            (None, false) => f64::INFINITY,
        };
        if end <= self.start {
            return Err(WindowError::EmptyWindow {
                start: self.start,
                end,
            });
        }

        let full = self.start == 0.0 && (end.is_infinite() || (known && end >= duration));
        Ok(ResolvedWindow {
            start: self.start,
            end,
            full,
        })
    }
}

impl ResolvedWindow {
    /// Indices of the frames whose timestamp `i / fps` lies in `[start, end)`.
    pub fn frame_range(&self, fps: f64) -> Result<Range<usize>, WindowError> {
        if self.full {
            return Ok(0..usize::MAX);
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(WindowError::UnknownFrameRate);
        }
        let first = frame_ceil(self.start * fps);
        let last = if self.end.is_infinite() {
            usize::MAX
        } else {
            frame_ceil(self.end * fps)
        };
        Ok(first..last)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// `ceil` that absorbs floating-point noise such as `2.0000000001`.
fn frame_ceil(position: f64) -> usize {
    const EPSILON: f64 = 1e-6;
    (position - EPSILON).ceil().max(0.0) as usize
}
