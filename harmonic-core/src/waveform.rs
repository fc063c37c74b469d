//! Travelling-wave synthesis
//!
//! Samples are laid out evenly over `[-x_range/2, x_range/2]`. The
//! travelling phase of a sample is measured from the left (leading)
//! edge:
//!
//! ```text
//! phase(x) = ((x - x_start) / period) * 2π + time_offset
//! y_i      = amplitude_i * global_scale * sin(n * phase + phase_i),  n = i + 1
//! ```
//!
//! so the leading sample has phase `time_offset`, which is the angle the
//! epicycle chain rotates by. The output is a pure function of the bank
//! snapshot, `time_offset` and [`WaveParams`].

use std::f64::consts::TAU;

use crate::bank::{HarmonicBank, HarmonicSlot};
use crate::params::WaveParams;

/// Fully recomputed sample set for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledWave {
    pub xs: Vec<f64>,
    pub sums: Vec<f64>,
    /// `harmonics[i][k]` is harmonic `i` at sample `k`. Empty in 2D mode.
    pub harmonics: Vec<Vec<f64>>,
}

/// Borrowed view of a single sample.
#[derive(Clone, Copy, Debug)]
pub struct WaveSample<'a> {
    pub x: f64,
    pub y_sum: f64,
    pub index: usize,
    wave: &'a SampledWave,
}

impl<'a> WaveSample<'a> {
    /// Value of active harmonic `i` at this sample, when retained.
    pub fn harmonic(&self, i: usize) -> Option<f64> {
        self.wave
            .harmonics
            .get(i)
            .and_then(|line| line.get(self.index))
            .copied()
    }
}

impl SampledWave {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<WaveSample<'_>> {
        Some(WaveSample {
            x: *self.xs.get(index)?,
            y_sum: *self.sums.get(index)?,
            index,
            wave: self,
        })
    }

    /// Restartable iteration over the samples.
    pub fn iter(&self) -> impl Iterator<Item = WaveSample<'_>> + '_ {
        (0..self.len()).filter_map(move |k| self.sample(k))
    }

    /// The sample every epicycle chain feeds into.
    pub fn leading(&self) -> Option<WaveSample<'_>> {
        self.sample(0)
    }
}

/// Travelling phase of a point at `x`.
#[inline]
pub fn travel_phase(x: f64, time_offset: f64, params: &WaveParams) -> f64 {
    ((x - params.x_start()) / params.period) * TAU + time_offset
}

/// Single-harmonic value, unscaled.
#[inline]
pub fn harmonic_value(i: usize, slot: &HarmonicSlot, phase: f64) -> f64 {
    let n = (i + 1) as f64;
    slot.amplitude * (n * phase + slot.phase).sin()
}

/// Partial Fourier sum of the active harmonics at one travelling phase.
pub fn partial_sum(bank: &HarmonicBank, phase: f64, global_scale: f64) -> f64 {
    bank.active_slots()
        .iter()
        .enumerate()
        .map(|(i, slot)| harmonic_value(i, slot, phase) * global_scale)
        .sum()
}

/// Sample the composite wave (and, outside 2D mode, each active harmonic).
pub fn synthesize(bank: &HarmonicBank, time_offset: f64, params: &WaveParams) -> SampledWave {
    let params = params.sanitized();
    let count = params.sample_count;
    let start = params.x_start();
    let dx = params.dx();
    let active = bank.active_slots();

    let mut xs = Vec::with_capacity(count);
    let mut sums = Vec::with_capacity(count);
    let mut harmonics: Vec<Vec<f64>> = if params.mode_2d {
        Vec::new()
    } else {
        vec![Vec::with_capacity(count); active.len()]
    };

    for k in 0..count {
        let x = start + k as f64 * dx;
        let phase = travel_phase(x, time_offset, &params);
        let mut y_sum = 0.0;
        for (i, slot) in active.iter().enumerate() {
            let y = harmonic_value(i, slot, phase) * params.global_scale;
            y_sum += y;
            if let Some(line) = harmonics.get_mut(i) {
                line.push(y);
            }
        }
        xs.push(x);
        sums.push(y_sum);
    }

    SampledWave {
        xs,
        sums,
        harmonics,
    }
}

/// Per-harmonic values at the centre sample, where the 3D view joins
/// every harmonic line to its baseline. Returns `(x, [y_i])`.
pub fn harmonic_slice(bank: &HarmonicBank, time_offset: f64, params: &WaveParams) -> (f64, Vec<f64>) {
    let params = params.sanitized();
    let index = params.sample_count / 2;
    let x = params.x_start() + index as f64 * params.dx();
    let phase = travel_phase(x, time_offset, &params);
    let values = bank
        .active_slots()
        .iter()
        .enumerate()
        .map(|(i, slot)| harmonic_value(i, slot, phase) * params.global_scale)
        .collect();
    (x, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_spans_range() {
        let bank = HarmonicBank::new();
        let p = WaveParams::default();
        let wave = synthesize(&bank, 0.0, &p);
        assert_eq!(wave.len(), p.sample_count);
        assert!((wave.xs[0] + 300.0).abs() < 1e-9);
        assert!((wave.xs[p.sample_count - 1] - 300.0).abs() < 1e-9);
    }

    #[test]
    fn mode_2d_skips_individual_lines() {
        let mut bank = HarmonicBank::new();
        bank.set_immediate(0, 10.0, 0.3).expect("slot");
        let mut p = WaveParams::default();
        p.mode_2d = true;
        let flat = synthesize(&bank, 1.0, &p);
        p.mode_2d = false;
        let full = synthesize(&bank, 1.0, &p);
        assert!(flat.harmonics.is_empty());
        assert_eq!(full.harmonics.len(), bank.active_count());
        assert_eq!(flat.sums, full.sums);
    }

    #[test]
    fn degenerate_sample_count_is_raised() {
        let bank = HarmonicBank::new();
        let mut p = WaveParams::default();
        p.sample_count = 0;
        assert_eq!(synthesize(&bank, 0.0, &p).len(), 2);
    }

    #[test]
    fn slice_matches_centre_sample() {
        let mut bank = HarmonicBank::new();
        bank.set_immediate(0, 12.0, 0.0).expect("slot");
        bank.set_immediate(2, -4.0, 1.0).expect("slot");
        let p = WaveParams::default();
        let wave = synthesize(&bank, 0.7, &p);
        let (x, ys) = harmonic_slice(&bank, 0.7, &p);
        let centre = wave.sample(p.sample_count / 2).expect("centre");
        assert!((x - centre.x).abs() < 1e-12);
        let sum: f64 = ys.iter().sum();
        assert!((sum - centre.y_sum).abs() < 1e-9);
        assert_eq!(centre.harmonic(2), Some(ys[2]));
    }
}
