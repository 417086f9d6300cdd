//! Speed-adaptive exponential smoothing.
//!
//! The blend factor ramps linearly between `alpha_min` and `alpha_max` as
//! the distance from the previous output grows from `low_threshold` to
//! `high_threshold`: jitter is heavily damped, fast motion passes through.

use super::geometry::{self, Point2};

/// Parameters for one smoother instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Blend factor at or below `low_threshold`.
    pub alpha_min: f32,
    /// Blend factor at or above `high_threshold`.
    pub alpha_max: f32,
    /// Step distance (normalized) treated as jitter.
    pub low_threshold: f32,
    /// Step distance (normalized) treated as intentional motion.
    pub high_threshold: f32,
}

impl SmoothingParams {
    /// Scroll centroid: wide dynamic range.
    pub const fn centroid() -> Self {
        Self {
            alpha_min: 0.08,
            alpha_max: 0.6,
            low_threshold: 0.002,
            high_threshold: 0.03,
        }
    }

    /// Pointer fingertip: faster, more deliberate motion expected.
    pub const fn pointer() -> Self {
        Self {
            alpha_min: 0.1,
            alpha_max: 0.8,
            low_threshold: 0.005,
            high_threshold: 0.05,
        }
    }

    /// Blend factor for a raw-to-previous distance.
    pub fn alpha_for(&self, distance: f32) -> f32 {
        if distance <= self.low_threshold {
            self.alpha_min
        } else if distance >= self.high_threshold {
            self.alpha_max
        } else {
            let t = (distance - self.low_threshold) / (self.high_threshold - self.low_threshold);
            geometry::lerp(self.alpha_min, self.alpha_max, t)
        }
    }
}

/// Exponential smoother for a 2-D point.
#[derive(Debug, Clone)]
pub struct AdaptiveSmoother {
    params: SmoothingParams,
    previous: Option<Point2>,
}

impl AdaptiveSmoother {
    pub fn new(params: SmoothingParams) -> Self {
        Self {
            params,
            previous: None,
        }
    }

    /// Smooth one raw sample.  The first sample after a reset passes
    /// through unchanged.
    pub fn apply(&mut self, raw: Point2) -> Point2 {
        let smoothed = match self.previous {
            None => raw,
            Some(prev) => {
                let alpha = self.params.alpha_for(geometry::distance(&prev, &raw));
                Point2::new(
                    geometry::lerp(prev.x, raw.x, alpha),
                    geometry::lerp(prev.y, raw.y, alpha),
                )
            }
        };
        self.previous = Some(smoothed);
        smoothed
    }

    /// Forget the last output; the next sample passes through.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
