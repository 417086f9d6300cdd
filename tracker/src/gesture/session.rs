//! Gesture session controller.
//!
//! Routes each frame through pose classification and then down exactly one
//! of the scroll path or the pointing path.  All per-gesture state lives in
//! `SessionState`; crossing a pose-class boundary reinitializes the other
//! path's fields before the mode is recomputed, so no trail or depth data
//! leaks from one gesture into the next.

use tracing::debug;

use super::click::{ClickConfig, ClickDetector};
use super::geometry::{self, Point2};
use super::landmarks::{Frame, HandLandmark, HandLandmarks};
use super::mode::{status_text, GestureMode};
use super::orientation::{detect_orientation, Orientation, OrientationConfig, OrientationTracker};
use super::pose::{classify_pose, PoseClass, PoseConfig};
use super::smoothing::{AdaptiveSmoother, SmoothingParams};
use super::trajectory::{
    analyze_movement, AnalysisConfig, TrackedPoint, TrajectoryHistory, HISTORY_CAPACITY,
};

// ── Config ─────────────────────────────────────────────────

/// Complete tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Process frames at all.
    pub enabled: bool,
    /// Scroll analysis is held off this long after the pose forms (ms).
    pub warmup_ms: f64,
    /// Trail capacity.
    pub history_capacity: usize,
    pub pose: PoseConfig,
    pub orientation: OrientationConfig,
    pub centroid_smoothing: SmoothingParams,
    pub pointer_smoothing: SmoothingParams,
    pub analysis: AnalysisConfig,
    pub click: ClickConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warmup_ms: 400.0,
            history_capacity: HISTORY_CAPACITY,
            pose: PoseConfig::default(),
            orientation: OrientationConfig::default(),
            centroid_smoothing: SmoothingParams::centroid(),
            pointer_smoothing: SmoothingParams::pointer(),
            analysis: AnalysisConfig::default(),
            click: ClickConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:enabled {} :warmup-ms {:.0} :transition-ms {:.0} :history-capacity {} :window {} :linearity-threshold {:.3} :dead-zone {:.4} :click-z-threshold {:.3} :click-cooldown-ms {:.0})",
            if self.enabled { "t" } else { "nil" },
            self.warmup_ms,
            self.orientation.transition_ms,
            self.history_capacity,
            self.analysis.window,
            self.analysis.linearity_threshold,
            self.analysis.dead_zone,
            self.click.z_threshold,
            self.click.cooldown_ms,
        )
    }
}

// ── Events ─────────────────────────────────────────────────

/// Side effects of one frame, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// The mode for this frame (always emitted, exactly once).
    ModeChanged { mode: GestureMode },
    /// Instantaneous scroll delta; positive = downward hand motion.
    Scroll { delta_y: f32 },
    /// Mirrored, smoothed pointer position in [0, 1] x [0, 1].
    CursorMoved { x: f32, y: f32 },
    /// A push-to-click was accepted.
    Click { timestamp_ms: f64 },
    /// Snapshot of the scroll trail after a sample was appended.
    HistoryUpdated { points: Vec<TrackedPoint> },
}

/// Consumer of tracker output.  Every callback defaults to a no-op.
pub trait GestureSink {
    fn on_gesture_change(&mut self, _mode: GestureMode) {}
    fn on_scroll(&mut self, _delta_y: f32) {}
    fn on_cursor_move(&mut self, _x: f32, _y: f32) {}
    fn on_click(&mut self) {}
    fn on_history_update(&mut self, _points: &[TrackedPoint]) {}
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub mode: GestureMode,
    /// Scroll delta reported this frame (0 outside the scroll path).
    pub scroll_delta: f32,
    pub events: Vec<GestureEvent>,
}

impl FrameOutput {
    /// Replay the events to a sink in emission order.
    pub fn deliver<S: GestureSink + ?Sized>(&self, sink: &mut S) {
        for event in &self.events {
            match event {
                GestureEvent::ModeChanged { mode } => sink.on_gesture_change(*mode),
                GestureEvent::Scroll { delta_y } => sink.on_scroll(*delta_y),
                GestureEvent::CursorMoved { x, y } => sink.on_cursor_move(*x, *y),
                GestureEvent::Click { .. } => sink.on_click(),
                GestureEvent::HistoryUpdated { points } => sink.on_history_update(points),
            }
        }
    }
}

#[cfg(test)]
impl FrameOutput {
    fn clicked(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GestureEvent::Click { .. }))
    }

    fn cursor(&self) -> Option<(f32, f32)> {
        self.events.iter().find_map(|e| match e {
            GestureEvent::CursorMoved { x, y } => Some((*x, *y)),
            _ => None,
        })
    }
}

// ── Session state ──────────────────────────────────────────

/// Scroll-path state.
#[derive(Debug, Clone)]
struct ScrollSession {
    /// When the current scroll gesture began, or None between gestures.
    started_at_ms: Option<f64>,
    history: TrajectoryHistory,
    centroid: AdaptiveSmoother,
}

impl ScrollSession {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            started_at_ms: None,
            history: TrajectoryHistory::new(config.history_capacity),
            centroid: AdaptiveSmoother::new(config.centroid_smoothing),
        }
    }

    /// End the gesture: no start time, empty trail, cold smoother.
    fn clear(&mut self) {
        self.started_at_ms = None;
        self.history.clear();
        self.centroid.reset();
    }
}

/// Pointing-path state.
#[derive(Debug, Clone)]
struct PointerSession {
    cursor: AdaptiveSmoother,
    click: ClickDetector,
}

impl PointerSession {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            cursor: AdaptiveSmoother::new(config.pointer_smoothing),
            click: ClickDetector::new(config.click.clone()),
        }
    }

    /// Reinitialize for a new pointing gesture.  The click cooldown
    /// carries over.
    fn restart(&mut self) {
        self.cursor.reset();
        self.click.clear_samples();
    }
}

/// All mutable per-session state, owned by the controller.
#[derive(Debug, Clone)]
struct SessionState {
    scroll: ScrollSession,
    pointer: PointerSession,
    orientation: OrientationTracker,
    last_pose: PoseClass,
    last_mode: GestureMode,
    last_timestamp_ms: Option<f64>,
}

impl SessionState {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            scroll: ScrollSession::new(config),
            pointer: PointerSession::new(config),
            orientation: OrientationTracker::new(&config.orientation),
            last_pose: PoseClass::NoHand,
            last_mode: GestureMode::Idle,
            last_timestamp_ms: None,
        }
    }
}

// ── Controller ─────────────────────────────────────────────

/// Frame-driven gesture state machine.
#[derive(Debug, Clone)]
pub struct GestureController {
    config: TrackerConfig,
    session: SessionState,
}

impl GestureController {
    pub fn new(config: TrackerConfig) -> Self {
        let session = SessionState::new(&config);
        Self { config, session }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the configuration.  Session state is rebuilt from it.
    pub fn set_config(&mut self, config: TrackerConfig) {
        self.config = config;
        self.session = SessionState::new(&self.config);
    }

    /// Clear every piece of session state, including orientation lock and
    /// click cooldown.
    pub fn reset(&mut self) {
        let session = &mut self.session;
        session.scroll.clear();
        session.pointer.cursor.reset();
        session.pointer.click.reset();
        session.orientation.reset();
        session.last_pose = PoseClass::NoHand;
        session.last_mode = GestureMode::Idle;
        session.last_timestamp_ms = None;
    }

    /// Mode reported for the latest frame.
    pub fn mode(&self) -> GestureMode {
        self.session.last_mode
    }

    pub fn last_pose(&self) -> PoseClass {
        self.session.last_pose
    }

    /// Timestamp of the latest processed frame, after clamping.
    pub fn last_timestamp_ms(&self) -> Option<f64> {
        self.session.last_timestamp_ms
    }

    pub fn history(&self) -> &TrajectoryHistory {
        &self.session.scroll.history
    }

    pub fn stable_orientation(&self) -> Orientation {
        self.session.orientation.stable()
    }

    /// Whether an orientation flip window is open at `now_ms`.
    pub fn in_transition(&self, now_ms: f64) -> bool {
        self.session.orientation.in_transition(now_ms)
    }

    /// Overlay hint for the latest frame.
    pub fn status_text(&self) -> &'static str {
        let history = &self.session.scroll.history;
        let last_orientation = history
            .last()
            .map(|p| p.orientation)
            .unwrap_or(Orientation::Neutral);
        status_text(self.session.last_mode, last_orientation, history.len())
    }

    /// Process one frame and return its mode and side effects.
    pub fn process(&mut self, frame: &Frame) -> FrameOutput {
        let now = self.monotonic(frame.timestamp_ms);
        let mut events = Vec::new();

        if !self.config.enabled {
            self.reset();
            self.session.last_timestamp_ms = Some(now);
            return self.finish(GestureMode::Idle, 0.0, events);
        }

        let pose = classify_pose(frame.hand.as_ref(), &self.config.pose);
        if pose != self.session.last_pose {
            debug!(
                "Pose change: {} -> {} at {:.0}ms",
                self.session.last_pose.as_str(),
                pose.as_str(),
                now
            );
            self.session.last_pose = pose;
        }

        match (pose, frame.hand.as_ref()) {
            (PoseClass::ScrollPose, Some(hand)) => {
                let (mode, delta) = self.scroll_frame(hand, now, &mut events);
                self.finish(mode, delta, events)
            }
            (PoseClass::PointPose, Some(hand)) => {
                let mode = self.point_frame(hand, now, &mut events);
                self.finish(mode, 0.0, events)
            }
            (PoseClass::IndeterminateHand, _) => {
                self.clear_scroll();
                self.clear_pointer();
                self.finish(GestureMode::HandDetected, 0.0, events)
            }
            _ => {
                self.clear_scroll();
                self.clear_pointer();
                self.finish(GestureMode::Idle, 0.0, events)
            }
        }
    }

    /// Scroll path: warm-up, orientation debounce, smoothing, analysis.
    fn scroll_frame(
        &mut self,
        hand: &HandLandmarks,
        now: f64,
        events: &mut Vec<GestureEvent>,
    ) -> (GestureMode, f32) {
        self.clear_pointer();

        let started_at = match self.session.scroll.started_at_ms {
            Some(start) => start,
            None => {
                self.session.scroll.clear();
                self.session.scroll.started_at_ms = Some(now);
                now
            }
        };
        let warming_up = now - started_at < self.config.warmup_ms;

        let index_tip = hand.planar(HandLandmark::IndexTip);
        let middle_tip = hand.planar(HandLandmark::MiddleTip);
        let orientation = detect_orientation(
            &index_tip,
            &middle_tip,
            self.config.orientation.dominance_ratio,
        );
        self.session.orientation.observe(orientation, now);
        let in_transition = self.session.orientation.in_transition(now);

        if in_transition {
            return (GestureMode::Transition, 0.0);
        }
        if warming_up {
            return (GestureMode::Idle, 0.0);
        }

        let raw = geometry::centroid(&index_tip, &middle_tip);
        let smoothed = self.session.scroll.centroid.apply(raw);
        let scroll = &mut self.session.scroll;
        scroll.history.push(TrackedPoint {
            x: smoothed.x,
            y: smoothed.y,
            timestamp_ms: now,
            orientation,
        });
        events.push(GestureEvent::HistoryUpdated {
            points: scroll.history.to_vec(),
        });

        let analysis = analyze_movement(&scroll.history, &self.config.analysis);
        (analysis.mode, analysis.delta_y)
    }

    /// Pointing path: smoothed mirrored cursor plus push-to-click.
    fn point_frame(
        &mut self,
        hand: &HandLandmarks,
        now: f64,
        events: &mut Vec<GestureEvent>,
    ) -> GestureMode {
        self.clear_scroll();

        let tip = hand.get(HandLandmark::IndexTip);
        let pointer = &mut self.session.pointer;
        let smoothed = pointer.cursor.apply(Point2::new(tip.x, tip.y));
        events.push(GestureEvent::CursorMoved {
            x: 1.0 - smoothed.x,
            y: smoothed.y,
        });

        if pointer.click.observe(tip.z, now) {
            events.push(GestureEvent::Click { timestamp_ms: now });
            GestureMode::Clicking
        } else {
            GestureMode::Pointing
        }
    }

    fn clear_scroll(&mut self) {
        self.session.scroll.clear();
    }

    fn clear_pointer(&mut self) {
        self.session.pointer.restart();
    }

    /// Clamp timestamps so time never runs backwards within a session.
    fn monotonic(&mut self, timestamp_ms: f64) -> f64 {
        let now = match self.session.last_timestamp_ms {
            Some(last) if timestamp_ms < last => {
                debug!(
                    "Ignoring timestamp {:.1}ms earlier than last {:.1}ms",
                    timestamp_ms, last
                );
                last
            }
            _ => timestamp_ms,
        };
        self.session.last_timestamp_ms = Some(now);
        now
    }

    /// Record the frame's mode and assemble its output.
    fn finish(&mut self, mode: GestureMode, delta: f32, mut events: Vec<GestureEvent>) -> FrameOutput {
        self.session.last_mode = mode;
        let scroll_delta = if mode == GestureMode::Scrolling { delta } else { 0.0 };

        // Path effects precede the mode report; the scroll delta follows it.
        events.push(GestureEvent::ModeChanged { mode });
        if mode == GestureMode::Scrolling {
            events.push(GestureEvent::Scroll { delta_y: scroll_delta });
        }

        FrameOutput {
            mode,
            scroll_delta,
            events,
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
