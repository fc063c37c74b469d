//! Per-tick orchestration
//!
//! [`HarmonicEngine`] owns the bank and the time cursor and runs one
//! frame in a fixed order:
//!
//! 1. audio mapping (audio mode only): amplitude targets, phase jitter,
//!    time nudge, beat notification;
//! 2. time cursor advance;
//! 3. bank smoothing step;
//! 4. waveform and epicycle synthesis from the post-step bank.
//!
//! Both synthesizers therefore see the same snapshot. Commands from the
//! host (slider edits, presets, count changes, market samples) mutate the
//! bank between ticks and notify listeners synchronously.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::SpectrumAnalyzer;
use crate::bank::{Apply, BankError, HarmonicBank, MarketSample};
use crate::clock::TimeCursor;
use crate::epicycle::{self, EpicycleChain};
use crate::events::{EventBus, HarmonicEvent};
use crate::market::MarketMappingMode;
use crate::params::{EngineParams, BASE_SENSITIVITY, INITIAL_PRESET_SCALE};
use crate::presets::WavePreset;
use crate::spectrum::{Beat, SpectrumInput, SpectrumMapper};
use crate::waveform::{self, SampledWave};

/// Source driving the harmonic targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Slider edits and presets.
    #[default]
    Manual,
    /// Live spectrum mapping every tick.
    Audio,
    /// Unattended display; numerically identical to manual.
    Auto,
}

impl InputMode {
    pub fn name(self) -> &'static str {
        match self {
            InputMode::Manual => "manual",
            InputMode::Audio => "audio",
            InputMode::Auto => "auto",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown input mode `{0}`")]
pub struct UnknownInputMode(pub String);

impl FromStr for InputMode {
    type Err = UnknownInputMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [InputMode::Manual, InputMode::Audio, InputMode::Auto]
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownInputMode(s.to_string()))
    }
}

/// Renderable output of one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub wave: SampledWave,
    pub chain: EpicycleChain,
    pub time_offset: f64,
    /// Aggregate spectrum energy on the byte scale; 0 outside audio mode.
    pub energy: f64,
    pub beat: Option<Beat>,
}

pub struct HarmonicEngine {
    bank: HarmonicBank,
    cursor: TimeCursor,
    params: EngineParams,
    mapper: SpectrumMapper,
    analyzer: SpectrumAnalyzer,
    events: EventBus,
    mode: InputMode,
    sensitivity: f64,
    market_loaded: bool,
    last_market_seq: Option<u64>,
}

impl fmt::Debug for HarmonicEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarmonicEngine")
            .field("mode", &self.mode)
            .field("active_count", &self.bank.active_count())
            .field("time_offset", &self.cursor.time_offset)
            .field("sensitivity", &self.sensitivity)
            .field("events", &self.events)
            .finish()
    }
}

impl Default for HarmonicEngine {
    fn default() -> Self {
        Self::new(EngineParams::default())
    }
}

impl HarmonicEngine {
    /// Start in manual mode with the square preset loaded instantly.
    pub fn new(params: EngineParams) -> Self {
        let params = params.sanitized();
        let mut bank = HarmonicBank::new();
        WavePreset::Square.apply(&mut bank, INITIAL_PRESET_SCALE, Apply::Instant);
        Self {
            bank,
            cursor: TimeCursor::new(params.time_speed),
            mapper: SpectrumMapper::new(params.spectrum),
            analyzer: SpectrumAnalyzer::default(),
            params,
            events: EventBus::new(),
            mode: InputMode::Manual,
            sensitivity: 1.0,
            market_loaded: false,
            last_market_seq: None,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        EngineParams::from_json(json).map(Self::new)
    }

    pub fn bank(&self) -> &HarmonicBank {
        &self.bank
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn time_offset(&self) -> f64 {
        self.cursor.time_offset
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn is_2d(&self) -> bool {
        self.params.wave.mode_2d
    }

    pub fn switch_mode(&mut self, mode: InputMode) {
        self.mode = mode;
        self.events.emit(&HarmonicEvent::ModeSwitched { mode });
    }

    pub fn set_2d(&mut self, enabled: bool) {
        self.params.wave.mode_2d = enabled;
        self.events.emit(&HarmonicEvent::Toggled2D { enabled });
    }

    /// Clamp and store the active count, then notify listeners.
    pub fn set_active_count(&mut self, n: usize) -> usize {
        let count = self.bank.set_active_count(n);
        self.events
            .emit(&HarmonicEvent::HarmonicCountChanged { count });
        count
    }

    /// User sensitivity; scaled by `BASE_SENSITIVITY` before mapping.
    /// Negative or non-finite values are ignored.
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        if sensitivity.is_finite() && sensitivity >= 0.0 {
            self.sensitivity = sensitivity;
        }
    }

    pub fn set_global_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.params.wave.global_scale = scale;
        }
    }

    pub fn set_target(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), BankError> {
        self.bank.set_target(i, amplitude, phase)
    }

    /// Slider drag: current and target move together.
    pub fn set_immediate(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), BankError> {
        self.bank.set_immediate(i, amplitude, phase)
    }

    pub fn apply_preset(&mut self, preset: WavePreset, scale: f64, apply: Apply) {
        preset.apply(&mut self.bank, scale, apply);
        self.events.emit(&HarmonicEvent::PresetSelected { preset });
    }

    /// Apply a market snapshot. The first one ever applied lands
    /// instantly, later ones become smoothing targets.
    pub fn apply_market_sample(&mut self, sample: &MarketSample, mode: Option<MarketMappingMode>) {
        let apply = if self.market_loaded {
            Apply::Smoothed
        } else {
            Apply::Instant
        };
        self.bank.apply_sample(sample, apply);
        self.market_loaded = true;
        log::debug!(
            "market sample {} applied ({apply:?})",
            sample.market_time
        );
        self.events.emit(&HarmonicEvent::MarketApplied {
            market_time: sample.market_time.clone(),
            mode,
        });
    }

    /// Apply a sample tagged with a fetch sequence number. Samples older
    /// than the last applied one are dropped; returns whether it applied.
    pub fn apply_market_update(
        &mut self,
        seq: u64,
        sample: &MarketSample,
        mode: Option<MarketMappingMode>,
    ) -> bool {
        if self.last_market_seq.is_some_and(|last| seq < last) {
            log::debug!(
                "dropping stale market sample #{seq} (last applied #{:?})",
                self.last_market_seq
            );
            return false;
        }
        self.last_market_seq = Some(seq);
        self.apply_market_sample(sample, mode);
        true
    }

    /// Run one frame of `dt` seconds. `spectrum` is only read in audio
    /// mode; `None` there is a neutral frame.
    pub fn tick(&mut self, dt: f64, spectrum: Option<SpectrumInput<'_>>) -> Frame {
        let mut energy = 0.0;
        let mut beat = None;
        if self.mode == InputMode::Audio {
            let frame = self.mapper.map(
                spectrum,
                self.bank.active_count(),
                self.sensitivity * BASE_SENSITIVITY,
            );
            frame.apply_to(&mut self.bank);
            self.cursor
                .nudge(frame.aggregate_energy, self.params.audio_time_nudge);
            energy = frame.aggregate_energy;
            beat = frame.beat;
            if let Some(b) = beat {
                self.events.emit(&HarmonicEvent::Beat {
                    strength: b.strength,
                });
            }
        }

        let t = self.cursor.advance(dt);
        self.bank.step(self.params.lerp_factor);

        Frame {
            wave: waveform::synthesize(&self.bank, t, &self.params.wave),
            chain: epicycle::synthesize_for_wave(
                &self.bank,
                t,
                &self.params.wave,
                &self.params.epicycle,
            ),
            time_offset: t,
            energy,
            beat,
        }
    }

    /// Analyse raw PCM with the built-in analyser, then [`Self::tick`].
    pub fn tick_pcm(&mut self, dt: f64, pcm: &[f32]) -> Frame {
        let bytes = self.analyzer.process(pcm).to_vec();
        self.tick(dt, Some(SpectrumInput::Bytes(&bytes)))
    }

    /// Per-harmonic values where the 3D view joins lines to baselines.
    pub fn harmonic_slice(&self) -> (f64, Vec<f64>) {
        waveform::harmonic_slice(&self.bank, self.cursor.time_offset, &self.params.wave)
    }
}
