//! PCM spectrum analyser
//!
//! A native stand-in for the browser analyser node that feeds the
//! spectrum mapper: Blackman-windowed FFT of the most recent
//! `fft_size` samples, per-bin temporal smoothing, then decibels mapped
//! onto bytes over `[min_db, max_db]`. With the default frame of 128
//! samples this yields 64 bins.

use std::f64::consts::TAU;
use std::sync::Arc;

use rustfft::{num_complex::Complex as FFTComplex, Fft, FftPlanner};

use crate::params::{
    ANALYSER_FFT_SIZE, ANALYSER_MAX_DB, ANALYSER_MIN_DB, ANALYSER_SMOOTHING, BYTE_MAX,
};
use crate::spectrum::SpectrumInput;

#[derive(Clone)]
pub struct SpectrumAnalyzer {
    fft_size: usize,
    smoothing: f64,
    min_db: f64,
    max_db: f64,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<FFTComplex<f64>>,
    smoothed: Vec<f64>,
    decibels: Vec<f32>,
    bytes: Vec<u8>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(ANALYSER_FFT_SIZE)
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("min_db", &self.min_db)
            .field("max_db", &self.max_db)
            .finish()
    }
}

impl SpectrumAnalyzer {
    /// `fft_size` is rounded up to an even number of at least 2.
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2).next_multiple_of(2);
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window = blackman_window(fft_size);
        let bins = fft_size / 2;
        Self {
            fft_size,
            smoothing: ANALYSER_SMOOTHING,
            min_db: ANALYSER_MIN_DB,
            max_db: ANALYSER_MAX_DB,
            window,
            fft,
            buffer: vec![FFTComplex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            decibels: vec![f32::NEG_INFINITY; bins],
            bytes: vec![0; bins],
        }
    }

    /// Override the temporal smoothing constant (clamped to [0, 1)).
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = if smoothing.is_finite() {
            smoothing.clamp(0.0, 0.999)
        } else {
            ANALYSER_SMOOTHING
        };
        self
    }

    /// Override the decibel window mapped onto bytes. Ignored unless
    /// `min_db < max_db`.
    pub fn with_db_range(mut self, min_db: f64, max_db: f64) -> Self {
        if min_db.is_finite() && max_db.is_finite() && min_db < max_db {
            self.min_db = min_db;
            self.max_db = max_db;
        }
        self
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Analyse the tail of `pcm` and return byte frequency data.
    pub fn process(&mut self, pcm: &[f32]) -> &[u8] {
        let n = self.fft_size;
        let tail = &pcm[pcm.len().saturating_sub(n)..];
        let pad = n - tail.len();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] as f64 };
            // Non-finite samples read as silence; smoothing must stay finite.
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = FFTComplex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let range = self.max_db - self.min_db;
        for k in 0..self.bin_count() {
            let c = self.buffer[k];
            let mag = (c.re * c.re + c.im * c.im).sqrt() / n as f64;
            let s = self.smoothing * self.smoothed[k] + (1.0 - self.smoothing) * mag;
            self.smoothed[k] = s;
            let db = if s > 0.0 { 20.0 * s.log10() } else { f64::NEG_INFINITY };
            self.decibels[k] = db as f32;
            let scaled = (BYTE_MAX / range) * (db - self.min_db);
            self.bytes[k] = if scaled.is_finite() {
                scaled.clamp(0.0, BYTE_MAX).floor() as u8
            } else {
                0
            };
        }
        &self.bytes
    }

    /// Byte data from the last `process` call.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decibel data from the last `process` call.
    pub fn decibels(&self) -> &[f32] {
        &self.decibels
    }

    pub fn byte_input(&self) -> SpectrumInput<'_> {
        SpectrumInput::Bytes(&self.bytes)
    }

    pub fn decibel_input(&self) -> SpectrumInput<'_> {
        SpectrumInput::Decibels {
            values: &self.decibels,
            min_db: self.min_db,
            max_db: self.max_db,
        }
    }

    /// Forget smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
        self.decibels.iter_mut().for_each(|v| *v = f32::NEG_INFINITY);
        self.bytes.iter_mut().for_each(|v| *v = 0);
    }
}

fn blackman_window(n: usize) -> Vec<f64> {
    const A0: f64 = 0.42;
    const A1: f64 = 0.5;
    const A2: f64 = 0.08;
    (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            A0 - A1 * (TAU * x).cos() + A2 * (2.0 * TAU * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_maps_to_zero() {
        let mut a = SpectrumAnalyzer::default();
        let out = a.process(&[0.0; 256]);
        assert_eq!(out.len(), 64);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_in_its_bin() {
        let mut a = SpectrumAnalyzer::new(128).with_smoothing(0.0);
        // Quiet enough that the main lobe does not saturate the bytes.
        let pcm: Vec<f32> = (0..128)
            .map(|i| (0.01 * (TAU * 8.0 * i as f64 / 128.0).sin()) as f32)
            .collect();
        let out = a.process(&pcm).to_vec();
        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(k, _)| k)
            .expect("bins");
        assert_eq!(peak, 8);
        assert!(out[8] > 150);
        assert!(out[30] < out[8]);
    }

    #[test]
    fn smoothing_decays_after_tone_stops() {
        let mut a = SpectrumAnalyzer::default();
        let pcm: Vec<f32> = (0..128)
            .map(|i| (TAU * 8.0 * i as f64 / 128.0).sin() as f32)
            .collect();
        let loud = a.process(&pcm)[8];
        let after = a.process(&[0.0; 128])[8];
        assert!(after > 0 && after <= loud);
        a.reset();
        assert!(a.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn nan_sample_does_not_poison_smoothing() {
        let tone: Vec<f32> = (0..128)
            .map(|i| (TAU * 8.0 * i as f64 / 128.0).sin() as f32)
            .collect();
        let mut glitched = tone.clone();
        glitched[64] = f32::NAN;

        let mut a = SpectrumAnalyzer::default();
        a.process(&glitched);
        assert!(a.decibels().iter().all(|d| !d.is_nan()));
        for _ in 0..200 {
            a.process(&tone);
        }
        let mut fresh = SpectrumAnalyzer::default();
        for _ in 0..200 {
            fresh.process(&tone);
        }
        assert_eq!(a.bytes()[8], 255);
        assert_eq!(a.bytes()[8], fresh.bytes()[8]);
    }
}
