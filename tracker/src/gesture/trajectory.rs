//! Scroll-centroid trail and the linearity/direction analysis over it.
//!
//! The history keeps the most recent smoothed centroid samples (bounded,
//! oldest evicted first).  `analyze_movement` looks at the newest window
//! of that trail and decides whether it is a clean, vertically dominated
//! straight line under a stable orientation, then reports the
//! instantaneous (unwindowed) vertical delta.

use std::collections::VecDeque;

use super::geometry::Point2;
use super::mode::GestureMode;
use super::orientation::Orientation;

/// Default trail capacity.
pub const HISTORY_CAPACITY: usize = 50;

/// One smoothed scroll-centroid sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPoint {
    pub x: f32,
    pub y: f32,
    /// Frame timestamp (ms).
    pub timestamp_ms: f64,
    /// Instantaneous orientation at the time of capture.
    pub orientation: Orientation,
}

impl TrackedPoint {
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

// ── History ────────────────────────────────────────────────

/// Bounded, time-ordered trail of smoothed samples.
#[derive(Debug, Clone)]
pub struct TrajectoryHistory {
    points: VecDeque<TrackedPoint>,
    capacity: usize,
}

impl TrajectoryHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if full.
    pub fn push(&mut self, point: TrackedPoint) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPoint> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&TrackedPoint> {
        self.points.back()
    }

    /// The newest `n` samples (or all, if fewer), oldest first.
    pub fn recent(&self, n: usize) -> Vec<TrackedPoint> {
        let start = self.points.len().saturating_sub(n);
        self.points.iter().skip(start).copied().collect()
    }

    /// Second-newest and newest samples.
    pub fn newest_pair(&self) -> Option<(&TrackedPoint, &TrackedPoint)> {
        let len = self.points.len();
        if len < 2 {
            return None;
        }
        Some((&self.points[len - 2], &self.points[len - 1]))
    }

    /// Snapshot of the whole trail, oldest first.
    pub fn to_vec(&self) -> Vec<TrackedPoint> {
        self.points.iter().copied().collect()
    }
}

impl Default for TrajectoryHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

// ── Analysis ───────────────────────────────────────────────

/// Thresholds for the movement analysis.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of newest samples examined.
    pub window: usize,
    /// Samples required before any verdict.
    pub min_samples: usize,
    /// Fraction of the window one orientation must exceed.
    pub dominance_fraction: f32,
    /// Maximum chord deviation for a linear trail.
    pub linearity_threshold: f32,
    /// Net |dy| must exceed this times net |dx|.
    pub vertical_ratio: f32,
    /// Instantaneous |dy| below this is reported as zero motion.
    pub dead_zone: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: 12,
            min_samples: 5,
            dominance_fraction: 0.7,
            linearity_threshold: 0.6,
            vertical_ratio: 0.4,
            dead_zone: 0.0005,
        }
    }
}

/// Outcome of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementAnalysis {
    /// `Scrolling` when the orientation and linearity gates pass, else `Idle`.
    pub mode: GestureMode,
    /// Accepted instantaneous vertical delta (0 when rejected).
    pub delta_y: f32,
    /// Dominant orientation of the window, if one passed the gate.
    pub dominant: Option<Orientation>,
    /// Max perpendicular distance from the window chord.
    pub deviation: f32,
}

impl MovementAnalysis {
    fn idle() -> Self {
        Self {
            mode: GestureMode::Idle,
            delta_y: 0.0,
            dominant: None,
            deviation: 0.0,
        }
    }
}

/// Max perpendicular distance of `points` from the chord joining the first
/// and last point.  A zero-length chord scores 0.
pub fn deviation_score(points: &[Point2]) -> f32 {
    let (Some(start), Some(end)) = (points.first(), points.last()) else {
        return 0.0;
    };

    // Line through start and end: a*x + b*y + c = 0
    let a = start.y - end.y;
    let b = end.x - start.x;
    let c = start.x * end.y - end.x * start.y;
    let den = (a * a + b * b).sqrt();
    if den <= 0.0 {
        return 0.0;
    }

    points
        .iter()
        .map(|p| (a * p.x + b * p.y + c).abs() / den)
        .fold(0.0, f32::max)
}

/// Dominant orientation of a window, if either axis exceeds the fraction.
fn dominant_orientation(window: &[TrackedPoint], fraction: f32) -> Option<Orientation> {
    let total = window.len() as f32;
    let horizontal = window
        .iter()
        .filter(|p| p.orientation == Orientation::Horizontal)
        .count() as f32;
    let vertical = window
        .iter()
        .filter(|p| p.orientation == Orientation::Vertical)
        .count() as f32;

    if horizontal > total * fraction {
        Some(Orientation::Horizontal)
    } else if vertical > total * fraction {
        Some(Orientation::Vertical)
    } else {
        None
    }
}

/// Analyze the trail.  Horizontal orientation only accepts downward motion
/// (dy > 0) and vertical only upward (dy < 0); the opposite sign keeps the
/// scrolling mode with a zero delta.
pub fn analyze_movement(history: &TrajectoryHistory, config: &AnalysisConfig) -> MovementAnalysis {
    if history.len() < config.min_samples.max(2) {
        return MovementAnalysis::idle();
    }

    let window = history.recent(config.window);

    let Some(dominant) = dominant_orientation(&window, config.dominance_fraction) else {
        return MovementAnalysis::idle();
    };

    let positions: Vec<Point2> = window.iter().map(TrackedPoint::position).collect();
    let deviation = deviation_score(&positions);
    if deviation >= config.linearity_threshold {
        return MovementAnalysis {
            deviation,
            ..MovementAnalysis::idle()
        };
    }

    let locked = MovementAnalysis {
        mode: GestureMode::Scrolling,
        delta_y: 0.0,
        dominant: Some(dominant),
        deviation,
    };

    let start = positions[0];
    let end = positions[positions.len() - 1];
    let net_dx = end.x - start.x;
    let net_dy = end.y - start.y;
    if net_dy.abs() <= net_dx.abs() * config.vertical_ratio {
        return locked;
    }

    let Some((prev, last)) = history.newest_pair() else {
        return locked;
    };
    let dy = last.y - prev.y;
    if dy.abs() < config.dead_zone {
        return locked;
    }

    let allowed = match dominant {
        Orientation::Horizontal => dy > 0.0,
        Orientation::Vertical => dy < 0.0,
        Orientation::Neutral => false,
    };
    if !allowed {
        return locked;
    }

    MovementAnalysis {
        delta_y: dy,
        ..locked
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn make_trail(ys: &[f32], x: f32, orientation: Orientation) -> TrajectoryHistory {
    let mut history = TrajectoryHistory::default();
    for (i, y) in ys.iter().enumerate() {
        history.push(TrackedPoint {
            x,
            y: *y,
            timestamp_ms: i as f64 * 33.0,
            orientation,
        });
    }
    history
}
