//! Fingertip-pair orientation and flip debouncing.
//!
//! `detect_orientation` labels the alignment of two points; the tracker
//! turns the per-frame label into a confirmed orientation and opens a
//! suppression window whenever a confirmed orientation flips.

use tracing::debug;

use super::geometry::Point2;

/// Alignment of the index/middle fingertip pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    Horizontal,
    Vertical,
    #[default]
    Neutral,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Neutral => "neutral",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

/// Orientation thresholds.
#[derive(Debug, Clone)]
pub struct OrientationConfig {
    /// One axis delta must exceed the other by this factor.
    pub dominance_ratio: f32,
    /// Suppression window after a flip (ms).
    pub transition_ms: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            dominance_ratio: 1.2,
            transition_ms: 500.0,
        }
    }
}

/// Classify the alignment of two points.  Symmetric in its arguments.
pub fn detect_orientation(a: &Point2, b: &Point2, dominance_ratio: f32) -> Orientation {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();

    if dx > dy * dominance_ratio {
        Orientation::Horizontal
    } else if dy > dx * dominance_ratio {
        Orientation::Vertical
    } else {
        Orientation::Neutral
    }
}

// ── Stability tracker ──────────────────────────────────────

/// Debounces orientation flips into a confirmed orientation.
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    /// Last confirmed non-neutral orientation (neutral until first lock-in).
    stable: Orientation,
    /// When the most recent flip happened.
    transition_started_ms: Option<f64>,
    /// Suppression window length (ms).
    transition_ms: f64,
}

impl OrientationTracker {
    pub fn new(config: &OrientationConfig) -> Self {
        Self {
            stable: Orientation::Neutral,
            transition_started_ms: None,
            transition_ms: config.transition_ms,
        }
    }

    /// Feed one instantaneous orientation.  Flipping an already-confirmed
    /// orientation opens the transition window.
    pub fn observe(&mut self, current: Orientation, now_ms: f64) {
        if current.is_neutral() || current == self.stable {
            return;
        }

        if !self.stable.is_neutral() {
            debug!(
                "Orientation flip: {} -> {} at {:.0}ms",
                self.stable.as_str(),
                current.as_str(),
                now_ms
            );
            self.transition_started_ms = Some(now_ms);
        }
        self.stable = current;
    }

    /// Confirmed orientation.
    pub fn stable(&self) -> Orientation {
        self.stable
    }

    /// Whether `now_ms` falls inside the window after the latest flip.
    pub fn in_transition(&self, now_ms: f64) -> bool {
        self.transition_started_ms
            .map(|start| now_ms - start < self.transition_ms)
            .unwrap_or(false)
    }

    /// Forget the confirmed orientation and any open window.
    pub fn reset(&mut self) {
        self.stable = Orientation::Neutral;
        self.transition_started_ms = None;
    }
}
