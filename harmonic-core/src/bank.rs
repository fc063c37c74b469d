//! Harmonic bank
//!
//! The bank is the single mutable source of truth for harmonic values.
//! Every slot carries a current amplitude/phase, which the synthesizers
//! read, and a target amplitude/phase which [`HarmonicBank::step`] eases
//! toward with exponential smoothing. All `MAX_HARMONICS` slots are kept
//! alive regardless of the active count, so lowering and raising the
//! count resumes the previous values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{sanitize_lerp, DEFAULT_ACTIVE_COUNT, MAX_HARMONICS};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BankError {
    #[error("harmonic slot {index} is out of range (expected < {})", MAX_HARMONICS)]
    SlotOutOfRange { index: usize },
}

/// One harmonic: current value plus smoothing destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSlot {
    pub amplitude: f64,
    pub phase: f64,
    pub target_amplitude: f64,
    pub target_phase: f64,
}

impl HarmonicSlot {
    /// Move current values a fraction `f` of the way to the targets.
    #[inline]
    pub fn step(&mut self, f: f64) {
        self.amplitude += (self.target_amplitude - self.amplitude) * f;
        self.phase += (self.target_phase - self.phase) * f;
    }
}

/// How an incoming set of values should be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Apply {
    /// Write targets only; the smoothing step eases into them.
    Smoothed,
    /// Write current and target together.
    Instant,
}

/// Immutable harmonic snapshot produced by a market mapping or loaded
/// from history. Consumed once to update the bank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSample {
    pub harmonics: Vec<f64>,
    pub phases: Vec<f64>,
    #[serde(default)]
    pub market_time: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicBank {
    slots: Vec<HarmonicSlot>,
    active_count: usize,
}

impl Default for HarmonicBank {
    fn default() -> Self {
        Self::new()
    }
}

impl HarmonicBank {
    /// A silent bank with the default active count.
    pub fn new() -> Self {
        Self {
            slots: vec![HarmonicSlot::default(); MAX_HARMONICS],
            active_count: DEFAULT_ACTIVE_COUNT,
        }
    }

    pub fn slot(&self, i: usize) -> Option<&HarmonicSlot> {
        self.slots.get(i)
    }

    pub fn slots(&self) -> &[HarmonicSlot] {
        &self.slots
    }

    /// Slots that participate in synthesis.
    pub fn active_slots(&self) -> &[HarmonicSlot] {
        &self.slots[..self.active_count.min(self.slots.len())]
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Clamp `n` to `[1, MAX_HARMONICS]` and return the value stored.
    pub fn set_active_count(&mut self, n: usize) -> usize {
        self.active_count = n.clamp(1, MAX_HARMONICS);
        self.active_count
    }

    /// Store smoothing destinations for slot `i`. Current values are
    /// untouched; amplitude is not clamped and phase is not wrapped.
    pub fn set_target(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), BankError> {
        let slot = self
            .slots
            .get_mut(i)
            .ok_or(BankError::SlotOutOfRange { index: i })?;
        slot.target_amplitude = amplitude;
        slot.target_phase = phase;
        Ok(())
    }

    /// Set current and target values together (first load, slider drag,
    /// instant preset).
    pub fn set_immediate(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), BankError> {
        let slot = self
            .slots
            .get_mut(i)
            .ok_or(BankError::SlotOutOfRange { index: i })?;
        *slot = HarmonicSlot {
            amplitude,
            phase,
            target_amplitude: amplitude,
            target_phase: phase,
        };
        Ok(())
    }

    /// Add `delta` to the current phase of slot `i`, bypassing smoothing.
    pub fn nudge_phase(&mut self, i: usize, delta: f64) -> Result<(), BankError> {
        let slot = self
            .slots
            .get_mut(i)
            .ok_or(BankError::SlotOutOfRange { index: i })?;
        slot.phase += delta;
        Ok(())
    }

    /// One smoothing tick over every slot, active or not.
    pub fn step(&mut self, lerp_factor: f64) {
        let f = sanitize_lerp(lerp_factor);
        for slot in self.slots.iter_mut() {
            slot.step(f);
        }
    }

    /// Load full amplitude/phase arrays. Missing entries read as zero and
    /// entries past `MAX_HARMONICS` are ignored.
    pub fn load(&mut self, amplitudes: &[f64], phases: &[f64], apply: Apply) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let a = amplitudes.get(i).copied().unwrap_or(0.0);
            let p = phases.get(i).copied().unwrap_or(0.0);
            slot.target_amplitude = a;
            slot.target_phase = p;
            if apply == Apply::Instant {
                slot.amplitude = a;
                slot.phase = p;
            }
        }
    }

    pub fn apply_sample(&mut self, sample: &MarketSample, apply: Apply) {
        self.load(&sample.harmonics, &sample.phases, apply);
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.amplitude).collect()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.phase).collect()
    }

    pub fn target_amplitudes(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.target_amplitude).collect()
    }

    pub fn target_phases(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.target_phase).collect()
    }
}
