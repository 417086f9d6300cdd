//! Externally visible gesture mode and its user-facing status text.

use super::orientation::Orientation;

/// What is happening this frame.  Recomputed from scratch every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureMode {
    /// No hand, or scroll warm-up in progress.
    #[default]
    Idle,
    /// Hand present but not in a recognized pose.
    HandDetected,
    Scrolling,
    Pointing,
    /// Pointing, and a click was accepted this frame.
    Clicking,
    /// An orientation flip is settling.
    Transition,
    /// Part of the consumer-facing vocabulary; no transition produces it yet.
    Resetting,
}

impl GestureMode {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HandDetected => "hand-detected",
            Self::Scrolling => "scrolling",
            Self::Pointing => "pointing",
            Self::Clicking => "clicking",
            Self::Transition => "transition",
            Self::Resetting => "resetting",
        }
    }
}

/// Human-readable hint for an overlay.  `last_orientation` is the tag of
/// the newest trail sample.  Labels describe page motion, which runs
/// opposite to the hand: a horizontal pull-down scrolls the page up.
pub fn status_text(mode: GestureMode, last_orientation: Orientation, history_len: usize) -> &'static str {
    match mode {
        GestureMode::Pointing => "CURSOR ACTIVE",
        GestureMode::Clicking => "CLICK DETECTED!",
        GestureMode::Transition => "RESTABILIZING...",
        GestureMode::Scrolling => match last_orientation {
            Orientation::Horizontal => "ACTIVE: SCROLL UP",
            Orientation::Vertical => "ACTIVE: SCROLL DOWN",
            Orientation::Neutral => "SCROLLING...",
        },
        GestureMode::HandDetected => "HAND DETECTED - EXTEND 2 FINGERS TO SCROLL",
        GestureMode::Idle if history_len > 0 => match last_orientation {
            Orientation::Horizontal => "READY: PULL DOWN",
            Orientation::Vertical => "READY: PUSH UP",
            Orientation::Neutral => "NO HAND DETECTED",
        },
        GestureMode::Idle | GestureMode::Resetting => "NO HAND DETECTED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODES: [GestureMode; 7] = [
        GestureMode::Idle,
        GestureMode::HandDetected,
        GestureMode::Scrolling,
        GestureMode::Pointing,
        GestureMode::Clicking,
        GestureMode::Transition,
        GestureMode::Resetting,
    ];

    #[test]
    fn test_as_str_names_are_distinct_kebab_case() {
        let names: Vec<&str> = ALL_MODES.iter().map(GestureMode::as_str).collect();
        for (i, name) in names.iter().enumerate() {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '-'), "{name}");
            assert!(!names[i + 1..].contains(name), "duplicate {name}");
        }
        assert_eq!(GestureMode::HandDetected.as_str(), "hand-detected");
        assert_eq!(GestureMode::Resetting.as_str(), "resetting");
    }

    #[test]
    fn test_status_text_scrolling() {
        assert_eq!(
            status_text(GestureMode::Scrolling, Orientation::Horizontal, 10),
            "ACTIVE: SCROLL UP"
        );
        assert_eq!(
            status_text(GestureMode::Scrolling, Orientation::Vertical, 10),
            "ACTIVE: SCROLL DOWN"
        );
        assert_eq!(
            status_text(GestureMode::Scrolling, Orientation::Neutral, 10),
            "SCROLLING..."
        );
    }

    #[test]
    fn test_status_text_idle_ready_hints() {
        assert_eq!(
            status_text(GestureMode::Idle, Orientation::Horizontal, 3),
            "READY: PULL DOWN"
        );
        assert_eq!(
            status_text(GestureMode::Idle, Orientation::Vertical, 3),
            "READY: PUSH UP"
        );
        assert_eq!(
            status_text(GestureMode::Idle, Orientation::Horizontal, 0),
            "NO HAND DETECTED"
        );
    }

    #[test]
    fn test_status_text_other_modes() {
        assert_eq!(status_text(GestureMode::Pointing, Orientation::Neutral, 0), "CURSOR ACTIVE");
        assert_eq!(status_text(GestureMode::Clicking, Orientation::Neutral, 0), "CLICK DETECTED!");
        assert_eq!(status_text(GestureMode::Transition, Orientation::Vertical, 5), "RESTABILIZING...");
        assert!(status_text(GestureMode::HandDetected, Orientation::Neutral, 0).starts_with("HAND DETECTED"));
    }
}
