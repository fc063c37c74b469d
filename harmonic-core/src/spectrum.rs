//! Spectrum → harmonic mapping
//!
//! Converts one magnitude snapshot into per-harmonic target amplitudes
//! and phase jitter. The bins are split into `active_count` contiguous
//! groups of `max(1, bins / active_count)` bins; each group's mean
//! (on a 0–255 scale) drives one harmonic:
//!
//! ```text
//! target_i = (avg_i / 255) * 100 * sensitivity * weight_i
//! jitter_i = (avg_i / 255) * jitter_gain * sensitivity   if avg_i > high_energy_threshold
//! ```
//!
//! Weights favour bass (lowest 20% of harmonics, 1.2) and treble
//! (highest 30%, 1.8) over the middle (1.0). Decibel input is first
//! normalised to [0, 1], shaped by `normalized^1.5`, then rescaled to the
//! byte range so every threshold is shared.

use crate::bank::HarmonicBank;
use crate::params::{
    SpectrumParams, BASS_WEIGHT, BYTE_MAX, MAX_HARMONICS, MID_WEIGHT, TREBLE_WEIGHT,
};

/// Magnitude representation supplied by the audio collaborator.
#[derive(Clone, Copy, Debug)]
pub enum SpectrumInput<'a> {
    /// Byte frequency data, 0–255 per bin.
    Bytes(&'a [u8]),
    /// Float frequency data in decibels.
    Decibels {
        values: &'a [f32],
        min_db: f64,
        max_db: f64,
    },
}

impl<'a> SpectrumInput<'a> {
    pub fn bin_count(&self) -> usize {
        match self {
            SpectrumInput::Bytes(b) => b.len(),
            SpectrumInput::Decibels { values, .. } => values.len(),
        }
    }

    /// Level of bin `k` on the byte scale; missing bins read as silence.
    fn level(&self, k: usize, exponent: f64) -> f64 {
        match *self {
            SpectrumInput::Bytes(b) => b.get(k).map(|v| *v as f64).unwrap_or(0.0),
            SpectrumInput::Decibels {
                values,
                min_db,
                max_db,
            } => {
                let Some(db) = values.get(k).map(|v| *v as f64) else {
                    return 0.0;
                };
                let range = max_db - min_db;
                if !db.is_finite() || !range.is_finite() || range <= 0.0 {
                    return 0.0;
                }
                let normalized = ((db - min_db) / range).clamp(0.0, 1.0);
                normalized.powf(exponent) * BYTE_MAX
            }
        }
    }
}

/// Mapping result for one harmonic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicTarget {
    pub amplitude: f64,
    /// Added straight to the current phase, bypassing smoothing.
    pub phase_jitter: f64,
    /// Group mean on the byte scale.
    pub level: f64,
}

/// Beat notification for visual reactions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beat {
    /// `aggregate_energy / 255`.
    pub strength: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumFrame {
    pub targets: Vec<HarmonicTarget>,
    /// Mean group level across harmonics, byte scale.
    pub aggregate_energy: f64,
    pub beat: Option<Beat>,
}

impl SpectrumFrame {
    /// No source: zero energy, no changes.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        self.targets.is_empty()
    }

    /// Write amplitude targets (keeping target phases) and apply jitter
    /// to current phases.
    pub fn apply_to(&self, bank: &mut HarmonicBank) {
        for (i, t) in self.targets.iter().enumerate() {
            let Some(slot) = bank.slot(i).copied() else {
                break;
            };
            // Indices come from the bank's own slots, so these cannot fail.
            let _ = bank.set_target(i, t.amplitude, slot.target_phase);
            if t.phase_jitter != 0.0 {
                let _ = bank.nudge_phase(i, t.phase_jitter);
            }
        }
    }
}

/// Frequency-band weight for harmonic `i` of `active_count`.
pub fn band_weight(i: usize, active_count: usize) -> f64 {
    // i < 0.2 * count and i >= 0.7 * count, in exact integer arithmetic.
    if 5 * i < active_count {
        BASS_WEIGHT
    } else if 10 * i >= 7 * active_count {
        TREBLE_WEIGHT
    } else {
        MID_WEIGHT
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SpectrumMapper {
    pub params: SpectrumParams,
}

impl SpectrumMapper {
    pub fn new(params: SpectrumParams) -> Self {
        Self { params }
    }

    /// Map a spectrum snapshot. `None` or an empty buffer yields
    /// [`SpectrumFrame::neutral`].
    pub fn map(
        &self,
        input: Option<SpectrumInput<'_>>,
        active_count: usize,
        sensitivity: f64,
    ) -> SpectrumFrame {
        let Some(input) = input else {
            return SpectrumFrame::neutral();
        };
        let bins = input.bin_count();
        if bins == 0 {
            return SpectrumFrame::neutral();
        }
        let active_count = active_count.clamp(1, MAX_HARMONICS);
        let sensitivity = if sensitivity.is_finite() { sensitivity } else { 0.0 };
        let per_harmonic = (bins / active_count).max(1);

        let mut targets = Vec::with_capacity(active_count);
        let mut total = 0.0;
        for i in 0..active_count {
            let start = i * per_harmonic;
            let sum: f64 = (start..start + per_harmonic)
                .map(|k| input.level(k, self.params.perceptual_exponent))
                .sum();
            let level = sum / per_harmonic as f64;
            total += level;

            let amplitude =
                (level / BYTE_MAX) * 100.0 * sensitivity * band_weight(i, active_count);
            let phase_jitter = if level > self.params.high_energy_threshold {
                (level / BYTE_MAX) * self.params.jitter_gain * sensitivity
            } else {
                0.0
            };
            targets.push(HarmonicTarget {
                amplitude,
                phase_jitter,
                level,
            });
        }

        let aggregate_energy = total / active_count as f64;
        let beat = (aggregate_energy > self.params.beat_threshold).then(|| Beat {
            strength: aggregate_energy / BYTE_MAX,
        });
        if let Some(b) = beat {
            log::debug!("beat detected, strength {:.3}", b.strength);
        }

        SpectrumFrame {
            targets,
            aggregate_energy,
            beat,
        }
    }
}
