//! Time cursor for the travelling wave.
//!
//! The cursor is the frame-rate source of truth for wave travel. It only
//! ever moves in one direction: `advance` subtracts `dt * speed`, and the
//! audio nudge subtracts as well, so loud passages speed the wave up
//! rather than reversing it.

use serde::{Deserialize, Serialize};

use crate::params::{BYTE_MAX, DEFAULT_TIME_SPEED};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeCursor {
    pub time_offset: f64,
    pub speed: f64,
}

impl Default for TimeCursor {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SPEED)
    }
}

impl TimeCursor {
    pub fn new(speed: f64) -> Self {
        Self {
            time_offset: 0.0,
            speed,
        }
    }

    /// Advance by one frame of `dt` seconds and return the new offset.
    /// Negative or non-finite `dt` (clock hiccups) is treated as zero.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.time_offset -= dt * self.speed;
        self.time_offset
    }

    /// Extra travel proportional to byte-scale audio energy.
    pub fn nudge(&mut self, energy: f64, gain: f64) -> f64 {
        if energy.is_finite() && energy > 0.0 {
            self.time_offset -= (energy / BYTE_MAX) * gain;
        }
        self.time_offset
    }

    pub fn reset(&mut self) {
        self.time_offset = 0.0;
    }
}
