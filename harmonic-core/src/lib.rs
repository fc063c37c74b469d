//! Harmonic synthesis core
//!
//! This crate holds the per-frame numeric pipeline of the harmonic
//! visualizer, independent of any rendering backend:
//!
//! 1. **Harmonic bank** – current and target amplitude/phase for 60
//!    slots, eased together by exponential smoothing every tick.
//! 2. **Synthesis** – the sampled travelling wave and the epicycle
//!    chain, both recomputed from the same post-smoothing snapshot so
//!    the chain's tip lines up with the wave's leading sample.
//! 3. **Mappers** – live audio spectra, market series and closed-form
//!    presets turned into harmonic targets.
//! 4. **Engine** – the tick loop tying these together, with input modes,
//!    synchronous event dispatch and a snapshot history for replay.
//!
//! The browser bindings live in the `wasm-harmonics` crate; this crate
//! is plain Rust and performs no I/O.

pub mod params;
pub mod geometry;
pub mod bank;
pub mod clock;
pub mod waveform;
pub mod epicycle;
pub mod spectrum;
pub mod analyzer;
pub mod market;
pub mod presets;
pub mod events;
pub mod history;
pub mod engine;

pub use bank::{Apply, BankError, HarmonicBank, HarmonicSlot, MarketSample};
pub use engine::{Frame, HarmonicEngine, InputMode};
pub use market::{MarketHarmonics, MarketMappingMode};
pub use params::{EngineParams, MAX_HARMONICS};
pub use presets::WavePreset;
