//! Aether tracker - hand-landmark gesture control.
//!
//! Converts a stream of 21-point hand landmarks into scroll deltas, a
//! pointer position and push-to-click events.

pub mod gesture;
pub mod ipc;
