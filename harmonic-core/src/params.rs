//! Shared constants and parameter structs.
//!
//! Every tunable of the pipeline lives here with its reference value.
//! The structs derive serde with `#[serde(default)]` so a host can ship a
//! partial JSON configuration and inherit the rest from [`Default`].

use serde::{Deserialize, Serialize};

/// Number of harmonic slots held by every bank.
pub const MAX_HARMONICS: usize = 60;
/// Samples per rendered wave line.
pub const POINTS_PER_LINE: usize = 400;
/// Active harmonic count on start-up.
pub const DEFAULT_ACTIVE_COUNT: usize = 10;

/// Per-tick interpolation fraction toward target values.
pub const DEFAULT_LERP_FACTOR: f64 = 0.06;
/// Time cursor speed in radians per second.
pub const DEFAULT_TIME_SPEED: f64 = 0.8;
/// Extra time-cursor travel per tick at full audio energy.
pub const DEFAULT_AUDIO_TIME_NUDGE: f64 = 0.02;

/// Horizontal extent of the wave lines.
pub const DEFAULT_X_RANGE: f64 = 600.0;
/// Wavelength of the fundamental, `0.4 * x_range`.
pub const DEFAULT_PERIOD: f64 = DEFAULT_X_RANGE * 0.4;
pub const DEFAULT_GLOBAL_SCALE: f64 = 1.0;

/// Amplitudes below this are drawn as placeholder rings.
pub const DEFAULT_PLACEHOLDER_THRESHOLD: f64 = 0.5;
/// Gap between the epicycle origin and the left edge of the wave.
pub const DEFAULT_EPICYCLE_GAP: f64 = 90.0;
/// Minimum rendered circle radius so a zero harmonic stays visible.
pub const MIN_CIRCLE_RADIUS: f64 = 0.001;

/// Multiplier applied to the user sensitivity before spectrum mapping.
pub const BASE_SENSITIVITY: f64 = 0.35;
/// Byte-scale level above which a harmonic's phase jitters.
pub const DEFAULT_HIGH_ENERGY_THRESHOLD: f64 = 50.0;
/// Byte-scale mean energy above which a beat is signalled.
pub const DEFAULT_BEAT_THRESHOLD: f64 = 150.0;
pub const DEFAULT_JITTER_GAIN: f64 = 0.1;
/// Exponent of the perceptual curve for decibel input.
pub const DEFAULT_PERCEPTUAL_EXPONENT: f64 = 1.5;
pub const BASS_WEIGHT: f64 = 1.2;
pub const TREBLE_WEIGHT: f64 = 1.8;
pub const MID_WEIGHT: f64 = 1.0;
/// Upper bound of byte-scale spectrum values.
pub const BYTE_MAX: f64 = 255.0;

/// Analyser frame size; yields `ANALYSER_FFT_SIZE / 2` bins.
pub const ANALYSER_FFT_SIZE: usize = 128;
pub const ANALYSER_SMOOTHING: f64 = 0.8;
pub const ANALYSER_MIN_DB: f64 = -100.0;
pub const ANALYSER_MAX_DB: f64 = -30.0;

/// Upper bound of market-derived amplitudes.
pub const MARKET_AMPLITUDE_SCALE: f64 = 80.0;
pub const MARKET_FALLBACK_AMPLITUDE: f64 = 10.0;
pub const STOCK_FALLBACK_AMPLITUDE: f64 = 5.0;

/// Preset scale used for the start-up square wave.
pub const INITIAL_PRESET_SCALE: f64 = 67.0;
/// Preset scale used by the preset buttons.
pub const UI_PRESET_SCALE: f64 = 45.0;

/// Timeline entries returned by default.
pub const TIMELINE_LIMIT: usize = 50;

/// Layout of the sampled travelling wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub sample_count: usize,
    pub x_range: f64,
    pub period: f64,
    pub global_scale: f64,
    /// When set only the sum line is produced.
    pub mode_2d: bool,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            sample_count: POINTS_PER_LINE,
            x_range: DEFAULT_X_RANGE,
            period: DEFAULT_PERIOD,
            global_scale: DEFAULT_GLOBAL_SCALE,
            mode_2d: false,
        }
    }
}

impl WaveParams {
    /// x coordinate of the first (leading) sample.
    pub fn x_start(&self) -> f64 {
        -self.x_range / 2.0
    }

    /// Spacing between samples. Requires `sample_count >= 2`.
    pub fn dx(&self) -> f64 {
        self.x_range / (self.sample_count.max(2) - 1) as f64
    }

    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.sample_count = self.sample_count.max(2);
        if !self.x_range.is_finite() || self.x_range <= 0.0 {
            self.x_range = defaults.x_range;
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            self.period = defaults.period;
        }
        if !self.global_scale.is_finite() {
            self.global_scale = defaults.global_scale;
        }
        self
    }
}

/// Placement and policy of the epicycle chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpicycleParams {
    pub placeholder_threshold: f64,
    /// Distance of the chain origin to the left of the wave.
    pub gap: f64,
    pub origin_y: f64,
}

impl Default for EpicycleParams {
    fn default() -> Self {
        Self {
            placeholder_threshold: DEFAULT_PLACEHOLDER_THRESHOLD,
            gap: DEFAULT_EPICYCLE_GAP,
            origin_y: 0.0,
        }
    }
}

/// Thresholds and gains of the spectrum mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumParams {
    pub high_energy_threshold: f64,
    pub beat_threshold: f64,
    pub jitter_gain: f64,
    pub perceptual_exponent: f64,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            high_energy_threshold: DEFAULT_HIGH_ENERGY_THRESHOLD,
            beat_threshold: DEFAULT_BEAT_THRESHOLD,
            jitter_gain: DEFAULT_JITTER_GAIN,
            perceptual_exponent: DEFAULT_PERCEPTUAL_EXPONENT,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub lerp_factor: f64,
    pub time_speed: f64,
    pub audio_time_nudge: f64,
    pub wave: WaveParams,
    pub epicycle: EpicycleParams,
    pub spectrum: SpectrumParams,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            lerp_factor: DEFAULT_LERP_FACTOR,
            time_speed: DEFAULT_TIME_SPEED,
            audio_time_nudge: DEFAULT_AUDIO_TIME_NUDGE,
            wave: WaveParams::default(),
            epicycle: EpicycleParams::default(),
            spectrum: SpectrumParams::default(),
        }
    }
}

impl EngineParams {
    /// Parse a (possibly partial) JSON configuration and sanitize it.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        Ok(params.sanitized())
    }

    /// Replace out-of-domain values with their defaults.
    pub fn sanitized(mut self) -> Self {
        self.lerp_factor = sanitize_lerp(self.lerp_factor);
        if !self.time_speed.is_finite() {
            self.time_speed = DEFAULT_TIME_SPEED;
        }
        if !self.audio_time_nudge.is_finite() {
            self.audio_time_nudge = DEFAULT_AUDIO_TIME_NUDGE;
        }
        self.wave = self.wave.sanitized();
        self
    }
}

/// Lerp factors must lie in (0, 1]; anything else falls back to the default.
pub fn sanitize_lerp(f: f64) -> f64 {
    if f.is_finite() && f > 0.0 && f <= 1.0 {
        f
    } else {
        DEFAULT_LERP_FACTOR
    }
}
