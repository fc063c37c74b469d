//! Harmonic visualizer engine for the browser
//!
//! WebAssembly bindings to harmonic_core. The host calls `tick` once per
//! animation frame and reads back flat `Float64Array`s for the wave
//! lines and the epicycle chain.

use wasm_bindgen::prelude::*;
use serde::Serialize;
use harmonic_core::bank::{Apply, MarketSample};
use harmonic_core::engine::{Frame, HarmonicEngine, InputMode};
use harmonic_core::market::{self, MarketMappingMode};
use harmonic_core::params::{
    BASE_SENSITIVITY, DEFAULT_LERP_FACTOR, DEFAULT_PERIOD, DEFAULT_TIME_SPEED,
    DEFAULT_X_RANGE, INITIAL_PRESET_SCALE, MAX_HARMONICS, POINTS_PER_LINE,
    UI_PRESET_SCALE, ANALYSER_FFT_SIZE,
};
use harmonic_core::presets::WavePreset;
use harmonic_core::spectrum::SpectrumInput;

/// Values per segment in [`Visualizer::epicycle_segments`].
const SEGMENT_STRIDE: usize = 6;

/// Shared constants exposed to JavaScript
#[wasm_bindgen]
pub fn constants() -> JsValue {
    #[derive(Serialize)]
    struct Constants {
        max_harmonics: usize,
        points_per_line: usize,
        x_range: f64,
        period: f64,
        lerp_factor: f64,
        time_speed: f64,
        base_sensitivity: f64,
        initial_preset_scale: f64,
        ui_preset_scale: f64,
        analyser_fft_size: usize,
        segment_stride: usize,
    }

    let c = Constants {
        max_harmonics: MAX_HARMONICS,
        points_per_line: POINTS_PER_LINE,
        x_range: DEFAULT_X_RANGE,
        period: DEFAULT_PERIOD,
        lerp_factor: DEFAULT_LERP_FACTOR,
        time_speed: DEFAULT_TIME_SPEED,
        base_sensitivity: BASE_SENSITIVITY,
        initial_preset_scale: INITIAL_PRESET_SCALE,
        ui_preset_scale: UI_PRESET_SCALE,
        analyser_fft_size: ANALYSER_FFT_SIZE,
        segment_stride: SEGMENT_STRIDE,
    };

    serde_wasm_bindgen::to_value(&c).unwrap_or_else(|_| JsValue::NULL)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_mode(mode: Option<String>) -> Result<Option<MarketMappingMode>, JsValue> {
    mode.map(|m| m.parse::<MarketMappingMode>().map_err(js_error))
        .transpose()
}

/// Engine plus the geometry of the last frame.
#[wasm_bindgen]
pub struct Visualizer {
    engine: HarmonicEngine,
    frame: Frame,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Visualizer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Visualizer {
        Visualizer {
            engine: HarmonicEngine::default(),
            frame: Frame::default(),
        }
    }

    /// Build from a (partial) JSON configuration.
    #[wasm_bindgen(js_name = "fromConfig")]
    pub fn from_config(json: &str) -> Result<Visualizer, JsValue> {
        let engine = HarmonicEngine::from_json(json).map_err(js_error)?;
        Ok(Visualizer {
            engine,
            frame: Frame::default(),
        })
    }

    /// Advance one frame. `spectrum` is byte frequency data, read in
    /// audio mode only. Returns the aggregate energy.
    pub fn tick(&mut self, dt: f64, spectrum: Option<Vec<u8>>) -> f64 {
        let input = spectrum.as_deref().map(SpectrumInput::Bytes);
        self.frame = self.engine.tick(dt, input);
        self.frame.energy
    }

    /// As [`Visualizer::tick`] with float decibel data.
    #[wasm_bindgen(js_name = "tickDecibels")]
    pub fn tick_decibels(&mut self, dt: f64, values: Vec<f32>, min_db: f64, max_db: f64) -> f64 {
        let input = SpectrumInput::Decibels {
            values: &values,
            min_db,
            max_db,
        };
        self.frame = self.engine.tick(dt, Some(input));
        self.frame.energy
    }

    /// Beat strength of the last frame, 0 when none fired.
    #[wasm_bindgen(getter)]
    pub fn beat(&self) -> f64 {
        self.frame.beat.map_or(0.0, |b| b.strength)
    }

    #[wasm_bindgen(getter)]
    pub fn time_offset(&self) -> f64 {
        self.engine.time_offset()
    }

    pub fn wave_xs(&self) -> Vec<f64> {
        self.frame.wave.xs.clone()
    }

    pub fn wave_sums(&self) -> Vec<f64> {
        self.frame.wave.sums.clone()
    }

    /// Line of active harmonic `i`; empty in 2D mode or out of range.
    pub fn wave_harmonic(&self, i: usize) -> Vec<f64> {
        self.frame.wave.harmonics.get(i).cloned().unwrap_or_default()
    }

    /// `[start_x, start_y, end_x, end_y, radius, placeholder]` per segment.
    pub fn epicycle_segments(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.frame.chain.len() * SEGMENT_STRIDE);
        for s in &self.frame.chain.segments {
            out.extend_from_slice(&[
                s.start.x,
                s.start.y,
                s.end.x,
                s.end.y,
                s.radius,
                if s.placeholder { 1.0 } else { 0.0 },
            ]);
        }
        out
    }

    /// `[x, y_0, y_1, ...]` at the centre sample.
    pub fn harmonic_slice(&self) -> Vec<f64> {
        let (x, ys) = self.engine.harmonic_slice();
        std::iter::once(x).chain(ys).collect()
    }

    pub fn set_target(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), JsValue> {
        self.engine.set_target(i, amplitude, phase).map_err(js_error)
    }

    pub fn set_immediate(&mut self, i: usize, amplitude: f64, phase: f64) -> Result<(), JsValue> {
        self.engine.set_immediate(i, amplitude, phase).map_err(js_error)
    }

    pub fn set_active_count(&mut self, n: usize) -> usize {
        self.engine.set_active_count(n)
    }

    #[wasm_bindgen(getter)]
    pub fn active_count(&self) -> usize {
        self.engine.bank().active_count()
    }

    /// `"manual"`, `"audio"` or `"auto"`.
    pub fn switch_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = mode.parse::<InputMode>().map_err(js_error)?;
        self.engine.switch_mode(mode);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.engine.mode().to_string()
    }

    pub fn apply_preset(&mut self, name: &str, scale: Option<f64>, instant: bool) -> Result<(), JsValue> {
        let preset = name.parse::<WavePreset>().map_err(js_error)?;
        let apply = if instant { Apply::Instant } else { Apply::Smoothed };
        self.engine
            .apply_preset(preset, scale.unwrap_or(UI_PRESET_SCALE), apply);
        Ok(())
    }

    /// `sample` is `{harmonics, phases, marketTime}`.
    pub fn apply_market_sample(&mut self, sample: JsValue, mode: Option<String>) -> Result<(), JsValue> {
        let sample: MarketSample = serde_wasm_bindgen::from_value(sample)?;
        let mode = parse_mode(mode)?;
        self.engine.apply_market_sample(&sample, mode);
        Ok(())
    }

    /// Sequence-guarded variant; returns false for a stale sample.
    pub fn apply_market_update(&mut self, seq: u32, sample: JsValue, mode: Option<String>) -> Result<bool, JsValue> {
        let sample: MarketSample = serde_wasm_bindgen::from_value(sample)?;
        let mode = parse_mode(mode)?;
        Ok(self.engine.apply_market_update(seq as u64, &sample, mode))
    }

    pub fn harmonics(&self) -> Vec<f64> {
        self.engine.bank().amplitudes()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.engine.bank().phases()
    }

    pub fn target_harmonics(&self) -> Vec<f64> {
        self.engine.bank().target_amplitudes()
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.engine.set_sensitivity(sensitivity);
    }

    pub fn set_global_scale(&mut self, scale: f64) {
        self.engine.set_global_scale(scale);
    }

    pub fn set_2d(&mut self, enabled: bool) {
        self.engine.set_2d(enabled);
    }

    /// Register `callback(event)` for every engine event. Events are
    /// objects tagged by `type` (`"beat"`, `"mode-switched"`, ...).
    pub fn on_event(&mut self, callback: js_sys::Function) {
        self.engine.events().subscribe_all(move |event| {
            let payload = serde_wasm_bindgen::to_value(event).unwrap_or(JsValue::NULL);
            let _ = callback.call1(&JsValue::NULL, &payload);
        });
    }
}

/// Map raw market series. Returns `{harmonics, phases}`.
#[wasm_bindgen]
pub fn map_market(mode: &str, prices: Vec<f64>, volumes: Vec<f64>) -> Result<JsValue, JsValue> {
    let mode = mode.parse::<MarketMappingMode>().map_err(js_error)?;
    let mapped = market::map(mode, &prices, &volumes);
    Ok(serde_wasm_bindgen::to_value(&mapped)?)
}

/// Map raw exchange report JSON. Bad reports yield the neutral fallback.
#[wasm_bindgen]
pub fn map_market_feeds(mode: &str, index_json: &str, volume_json: &str) -> Result<JsValue, JsValue> {
    let mode = mode.parse::<MarketMappingMode>().map_err(js_error)?;
    let mapped = market::feed::map_feeds(mode, index_json, volume_json);
    Ok(serde_wasm_bindgen::to_value(&mapped)?)
}

/// Preset amplitudes for `name` at `scale` (phases are all zero).
#[wasm_bindgen]
pub fn preset(name: &str, scale: f64) -> Result<Vec<f64>, JsValue> {
    let preset = name.parse::<WavePreset>().map_err(js_error)?;
    Ok(preset.generate(scale).0)
}
