//! Per-frame pose classification.
//!
//! Decides between the two-finger scroll pose, the single-finger point
//! pose, and "some other hand" using only wrist-relative distance ratios.
//! Each finger is judged against its own knuckle, so no global hand-size
//! constant is needed.

use super::landmarks::{HandLandmark, HandLandmarks};

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PoseClass {
    /// No landmark set was supplied.
    #[default]
    NoHand,
    /// Index and middle fingers extended.
    ScrollPose,
    /// Index extended, middle and ring curled.
    PointPose,
    /// A hand is present but matches neither pose.
    IndeterminateHand,
}

impl PoseClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoHand => "no-hand",
            Self::ScrollPose => "scroll-pose",
            Self::PointPose => "point-pose",
            Self::IndeterminateHand => "indeterminate-hand",
        }
    }
}

/// Ratio thresholds, tip-to-wrist over knuckle-to-wrist.
#[derive(Debug, Clone)]
pub struct PoseConfig {
    /// Extension ratio both scroll fingers must exceed.
    pub scroll_extension_ratio: f32,
    /// Extension ratio the pointing index finger must exceed.
    pub point_extension_ratio: f32,
    /// Ratio below which middle and ring count as curled when pointing.
    pub curl_ratio: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            scroll_extension_ratio: 1.1,
            point_extension_ratio: 1.2,
            curl_ratio: 1.1,
        }
    }
}

/// Classify a landmark set (or its absence).
pub fn classify_pose(hand: Option<&HandLandmarks>, config: &PoseConfig) -> PoseClass {
    let Some(hand) = hand else {
        return PoseClass::NoHand;
    };

    let index_scroll = is_extended(
        hand,
        HandLandmark::IndexMcp,
        HandLandmark::IndexTip,
        config.scroll_extension_ratio,
    );
    let middle_scroll = is_extended(
        hand,
        HandLandmark::MiddleMcp,
        HandLandmark::MiddleTip,
        config.scroll_extension_ratio,
    );
    if index_scroll && middle_scroll {
        return PoseClass::ScrollPose;
    }

    let index_point = is_extended(
        hand,
        HandLandmark::IndexMcp,
        HandLandmark::IndexTip,
        config.point_extension_ratio,
    );
    let middle_curled = is_curled(
        hand,
        HandLandmark::MiddleMcp,
        HandLandmark::MiddleTip,
        config.curl_ratio,
    );
    let ring_curled = is_curled(
        hand,
        HandLandmark::RingMcp,
        HandLandmark::RingTip,
        config.curl_ratio,
    );
    if index_point && middle_curled && ring_curled {
        return PoseClass::PointPose;
    }

    PoseClass::IndeterminateHand
}

/// Tip farther from the wrist than `ratio` times the knuckle distance.
fn is_extended(hand: &HandLandmarks, knuckle: HandLandmark, tip: HandLandmark, ratio: f32) -> bool {
    let tip_dist = hand.planar_distance(HandLandmark::Wrist, tip);
    let knuckle_dist = hand.planar_distance(HandLandmark::Wrist, knuckle);
    tip_dist > knuckle_dist * ratio
}

fn is_curled(hand: &HandLandmarks, knuckle: HandLandmark, tip: HandLandmark, ratio: f32) -> bool {
    let tip_dist = hand.planar_distance(HandLandmark::Wrist, tip);
    let knuckle_dist = hand.planar_distance(HandLandmark::Wrist, knuckle);
    tip_dist < knuckle_dist * ratio
}
