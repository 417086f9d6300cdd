//! Line-oriented s-expression protocol for driving the tracker.
//!
//! Each input line is one plist message; each output line is one response
//! or event.

pub mod dispatch;
pub mod stream;

pub use dispatch::{format_gesture_event, handle_message, Reply};
pub use stream::{run_stream, StreamStats};
