//! Hand landmark data structures.
//!
//! Models the 21 landmarks per hand produced by the external inference
//! stage, in normalized frame coordinates.  The core never mutates them.

use tracing::debug;

use super::geometry::{self, Point2};

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in the order the inference stage emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

// ── Landmark ───────────────────────────────────────────────

/// One landmark: normalized x/y in [0, 1], relative depth z
/// (negative = toward the camera).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Projection onto the image plane.
    pub fn planar(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

// ── Hand ───────────────────────────────────────────────────

/// A complete landmark set for one detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Build a landmark set.  Returns `None` unless exactly 21 points are
    /// supplied; callers treat a rejected set as "no hand".
    pub fn from_points(points: Vec<Landmark>) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            debug!(
                "Hand landmarks: expected {} points, got {}",
                LANDMARK_COUNT,
                points.len(),
            );
            return None;
        }
        let mut array = [Landmark::default(); LANDMARK_COUNT];
        array.copy_from_slice(&points);
        Some(Self { points: array })
    }

    pub fn get(&self, landmark: HandLandmark) -> Landmark {
        self.points[landmark.index()]
    }

    pub fn planar(&self, landmark: HandLandmark) -> Point2 {
        self.get(landmark).planar()
    }

    /// Image-plane distance between two landmarks (depth ignored).
    pub fn planar_distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        geometry::distance(&self.planar(a), &self.planar(b))
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One input frame: zero or one hand plus a monotonic timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Detected hand, or `None` when no hand is visible.
    pub hand: Option<HandLandmarks>,
}

impl Frame {
    pub fn with_hand(timestamp_ms: f64, hand: HandLandmarks) -> Self {
        Self {
            timestamp_ms,
            hand: Some(hand),
        }
    }

    pub fn empty(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            hand: None,
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Offsets from the wrist for a hand with index and middle fingers
/// extended upward and ring/pinky curled.
#[cfg(test)]
const TWO_FINGER_OFFSETS: [(f32, f32); LANDMARK_COUNT] = [
    (0.0, 0.0),     // wrist
    (-0.05, -0.04), // thumb cmc
    (-0.08, -0.08), // thumb mcp
    (-0.09, -0.11), // thumb ip
    (-0.06, -0.12), // thumb tip
    (-0.04, -0.20), // index mcp
    (-0.04, -0.28), // index pip
    (-0.04, -0.34), // index dip
    (-0.04, -0.40), // index tip
    (0.0, -0.20),   // middle mcp
    (0.0, -0.29),   // middle pip
    (0.0, -0.36),   // middle dip
    (0.0, -0.42),   // middle tip
    (0.04, -0.19),  // ring mcp
    (0.04, -0.14),  // ring pip
    (0.035, -0.12), // ring dip
    (0.03, -0.13),  // ring tip
    (0.07, -0.17),  // pinky mcp
    (0.07, -0.13),  // pinky pip
    (0.065, -0.11), // pinky dip
    (0.06, -0.12),  // pinky tip
];

/// Build a hand from wrist-relative offsets, placing the wrist at
/// `(wrist_x, wrist_y)`.
#[cfg(test)]
pub(crate) fn make_hand(wrist_x: f32, wrist_y: f32) -> HandLandmarks {
    let points = TWO_FINGER_OFFSETS
        .iter()
        .map(|(dx, dy)| Landmark::new(wrist_x + dx, wrist_y + dy, 0.0))
        .collect();
    HandLandmarks::from_points(points).unwrap()
}

#[cfg(test)]
pub(crate) fn set_landmark(hand: &mut HandLandmarks, landmark: HandLandmark, x: f32, y: f32, z: f32) {
    hand.points[landmark.index()] = Landmark::new(x, y, z);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::IndexMcp.index(), 5);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MiddleMcp.index(), 9);
        assert_eq!(HandLandmark::MiddleTip.index(), 12);
        assert_eq!(HandLandmark::RingMcp.index(), 13);
        assert_eq!(HandLandmark::RingTip.index(), 16);
        assert_eq!(HandLandmark::PinkyTip.index(), LANDMARK_COUNT - 1);
    }

    #[test]
    fn test_from_points_rejects_wrong_count() {
        assert!(HandLandmarks::from_points(vec![Landmark::default(); 20]).is_none());
        assert!(HandLandmarks::from_points(vec![Landmark::default(); 22]).is_none());
        assert!(HandLandmarks::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_from_points_preserves_order() {
        let points: Vec<Landmark> = (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f32 * 0.01, 0.5, -(i as f32) * 0.001))
            .collect();
        let hand = HandLandmarks::from_points(points).unwrap();
        assert!((hand.get(HandLandmark::IndexTip).x - 0.08).abs() < 1e-6);
        assert!((hand.get(HandLandmark::RingTip).z + 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_planar_distance_ignores_depth() {
        let mut hand = make_hand(0.5, 0.9);
        set_landmark(&mut hand, HandLandmark::Wrist, 0.0, 0.0, 5.0);
        set_landmark(&mut hand, HandLandmark::IndexTip, 0.3, 0.4, -5.0);
        let d = hand.planar_distance(HandLandmark::Wrist, HandLandmark::IndexTip);
        assert!((d - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_frame_constructors() {
        let hand = make_hand(0.5, 0.9);
        assert!(Frame::with_hand(10.0, hand).hand.is_some());
        assert!(Frame::empty(10.0).hand.is_none());
    }
}
