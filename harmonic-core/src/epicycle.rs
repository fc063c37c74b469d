//! Epicycle construction
//!
//! The 2D decomposition view draws each active harmonic as a circle
//! whose centre rides on the tip of the previous circle's radius.
//! Starting at the origin, harmonic `i` (n = i + 1) contributes
//!
//! ```text
//! θ   = n * time_offset + phase_i
//! tip = tip + amplitude_i * global_scale * (cos θ, sin θ)
//! ```
//!
//! The angle uses the same convention as the leading sample of the
//! travelling wave, so `tip.y - origin.y` equals that sample's sum. The
//! connector drawn from the tip to the wave relies on this.

use crate::bank::HarmonicBank;
use crate::geometry::Point2;
use crate::params::{EpicycleParams, WaveParams, MIN_CIRCLE_RADIUS};

/// One rotating radius of the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpicycleSegment {
    pub harmonic: usize,
    pub start: Point2,
    pub end: Point2,
    pub theta: f64,
    /// Circle radius for rendering, never below `MIN_CIRCLE_RADIUS * scale`.
    pub radius: f64,
    /// Near-silent harmonic; rendered as a marker ring at `start`.
    pub placeholder: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpicycleChain {
    pub origin: Point2,
    pub segments: Vec<EpicycleSegment>,
}

impl EpicycleChain {
    /// Endpoint of the last radius (the origin for an empty chain).
    pub fn tip(&self) -> Point2 {
        self.segments.last().map(|s| s.end).unwrap_or(self.origin)
    }

    /// Horizontal line from the tip to the wave's leading edge.
    pub fn connector(&self, leading_x: f64) -> (Point2, Point2) {
        let tip = self.tip();
        (tip, Point2::new(leading_x, tip.y))
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &EpicycleSegment> + '_ {
        self.segments.iter().filter(|s| s.placeholder)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Build the chain of rotating radii for the active harmonics.
///
/// Near-zero harmonics are flagged as placeholders but still advance the
/// chain by their true amplitude so later circles stay consistent.
pub fn synthesize(
    bank: &HarmonicBank,
    time_offset: f64,
    origin: Point2,
    global_scale: f64,
    placeholder_threshold: f64,
) -> EpicycleChain {
    let mut segments = Vec::with_capacity(bank.active_count());
    let mut cursor = origin;

    for (i, slot) in bank.active_slots().iter().enumerate() {
        let n = (i + 1) as f64;
        let theta = n * time_offset + slot.phase;
        let scaled = slot.amplitude * global_scale;
        let end = cursor + Point2::from_polar(scaled, theta);
        segments.push(EpicycleSegment {
            harmonic: i,
            start: cursor,
            end,
            theta,
            radius: slot.amplitude.abs().max(MIN_CIRCLE_RADIUS) * global_scale.abs(),
            placeholder: slot.amplitude.abs() < placeholder_threshold,
        });
        cursor = end;
    }

    EpicycleChain { origin, segments }
}

/// Chain placed to the left of the wave described by `wave`.
pub fn synthesize_for_wave(
    bank: &HarmonicBank,
    time_offset: f64,
    wave: &WaveParams,
    params: &EpicycleParams,
) -> EpicycleChain {
    let origin = Point2::new(wave.x_start() - params.gap, params.origin_y);
    synthesize(
        bank,
        time_offset,
        origin,
        wave.global_scale,
        params.placeholder_threshold,
    )
}
