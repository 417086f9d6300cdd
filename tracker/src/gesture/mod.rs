//! Gesture pipeline: turns per-frame hand landmarks into scroll, pointer
//! and click output.
//!
//! Provides:
//! - `pose`: stateless scroll/point/other classification
//! - `orientation`: fingertip alignment and flip debouncing
//! - `smoothing`: speed-adaptive exponential smoothing
//! - `trajectory`: centroid trail and linearity/direction analysis
//! - `click`: depth-push click detection
//! - `session`: the per-frame state machine tying the above together
//!
//! Nothing here performs I/O; the `ipc` module drives it from a stream.

pub mod click;
pub mod geometry;
pub mod landmarks;
pub mod mode;
pub mod orientation;
pub mod pose;
pub mod session;
pub mod smoothing;
pub mod trajectory;

pub use landmarks::{Frame, HandLandmark, HandLandmarks, Landmark, LANDMARK_COUNT};
pub use mode::GestureMode;
pub use orientation::Orientation;
pub use session::{FrameOutput, GestureController, GestureEvent, GestureSink, TrackerConfig};
pub use trajectory::TrackedPoint;
