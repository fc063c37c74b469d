//! Closed-form Fourier series for the named waveform presets.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{Apply, HarmonicBank};
use crate::params::MAX_HARMONICS;

/// Harmonics boosted by the pulse preset.
const PULSE_LOW_HARMONICS: usize = 5;
const PULSE_LOW_LEVEL: f64 = 0.6;
const PULSE_HIGH_LEVEL: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavePreset {
    Square,
    Sawtooth,
    Triangle,
    Pulse,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown preset `{0}`")]
pub struct UnknownPreset(pub String);

impl WavePreset {
    pub const ALL: [WavePreset; 4] = [
        WavePreset::Square,
        WavePreset::Sawtooth,
        WavePreset::Triangle,
        WavePreset::Pulse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WavePreset::Square => "square",
            WavePreset::Sawtooth => "sawtooth",
            WavePreset::Triangle => "triangle",
            WavePreset::Pulse => "pulse",
        }
    }

    /// Amplitude of harmonic number `n` (1-based).
    pub fn amplitude(self, n: usize, scale: f64) -> f64 {
        let nf = n as f64;
        let odd = n % 2 == 1;
        match self {
            WavePreset::Square if odd => scale * 4.0 / (nf * PI),
            WavePreset::Sawtooth => {
                let sign = if odd { 1.0 } else { -1.0 };
                scale * 2.0 / (nf * PI) * sign
            }
            WavePreset::Triangle if odd => {
                let sign = if ((n - 1) / 2) % 2 == 0 { 1.0 } else { -1.0 };
                scale * 8.0 / (PI * PI * nf * nf) * sign
            }
            WavePreset::Pulse if n <= PULSE_LOW_HARMONICS => scale * PULSE_LOW_LEVEL,
            WavePreset::Pulse => scale * PULSE_HIGH_LEVEL,
            WavePreset::Square | WavePreset::Triangle => 0.0,
        }
    }

    /// Full amplitude and phase arrays; phases are all zero.
    pub fn generate(self, scale: f64) -> (Vec<f64>, Vec<f64>) {
        let amps = (1..=MAX_HARMONICS).map(|n| self.amplitude(n, scale)).collect();
        (amps, vec![0.0; MAX_HARMONICS])
    }

    /// Write the preset into `bank`, as targets or instantly.
    pub fn apply(self, bank: &mut HarmonicBank, scale: f64, apply: Apply) {
        let (amps, phases) = self.generate(scale);
        bank.load(&amps, &phases, apply);
        log::debug!("preset {} applied at scale {scale} ({apply:?})", self.name());
    }
}

impl fmt::Display for WavePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WavePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

/// `generate(name, scale)` keyed by preset name.
pub fn generate(name: &str, scale: f64) -> Result<(Vec<f64>, Vec<f64>), UnknownPreset> {
    Ok(name.parse::<WavePreset>()?.generate(scale))
}
