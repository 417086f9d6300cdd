//! Push-to-click detection from fingertip depth.
//!
//! Keeps a short ring of recent z samples and fires when the fingertip has
//! moved toward the camera by more than the threshold across the ring.
//! The ring is cleared on every accepted click so one push fires once.

use std::collections::VecDeque;

use tracing::debug;

/// Click thresholds.
#[derive(Debug, Clone)]
pub struct ClickConfig {
    /// Depth samples kept.
    pub window: usize,
    /// Samples needed before evaluating.
    pub min_samples: usize,
    /// Newest-minus-oldest z below this fires (negative = toward camera).
    pub z_threshold: f32,
    /// Minimum time between accepted clicks (ms).
    pub cooldown_ms: f64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_samples: 3,
            z_threshold: -0.06,
            cooldown_ms: 1000.0,
        }
    }
}

/// Windowed depth-push detector with a refractory cooldown.
#[derive(Debug, Clone)]
pub struct ClickDetector {
    config: ClickConfig,
    depths: VecDeque<f32>,
    last_click_ms: Option<f64>,
}

impl ClickDetector {
    pub fn new(config: ClickConfig) -> Self {
        let window = config.window.max(1);
        Self {
            config,
            depths: VecDeque::with_capacity(window),
            last_click_ms: None,
        }
    }

    /// Record one depth sample.  Returns true if a click is accepted.
    pub fn observe(&mut self, z: f32, now_ms: f64) -> bool {
        if self.depths.len() >= self.config.window.max(1) {
            self.depths.pop_front();
        }
        self.depths.push_back(z);

        let Some(delta_z) = self.depth_delta() else {
            return false;
        };
        if delta_z >= self.config.z_threshold || self.cooling_down(now_ms) {
            return false;
        }

        debug!("Click accepted: dz={:.3} at {:.0}ms", delta_z, now_ms);
        self.last_click_ms = Some(now_ms);
        self.depths.clear();
        true
    }

    /// Newest minus oldest depth, once enough samples are buffered.
    pub fn depth_delta(&self) -> Option<f32> {
        if self.depths.len() < self.config.min_samples {
            return None;
        }
        match (self.depths.front(), self.depths.back()) {
            (Some(oldest), Some(newest)) => Some(newest - oldest),
            _ => None,
        }
    }

    /// Whether the cooldown after the last click is still running.
    pub fn cooling_down(&self, now_ms: f64) -> bool {
        self.last_click_ms
            .map(|last| now_ms - last < self.config.cooldown_ms)
            .unwrap_or(false)
    }

    /// Drop buffered depth samples; the cooldown survives.
    pub fn clear_samples(&mut self) {
        self.depths.clear();
    }

    /// Drop samples and forget the last click.
    pub fn reset(&mut self) {
        self.depths.clear();
        self.last_click_ms = None;
    }
}
