//! The four market mappings.

use std::f64::consts::PI;

use super::dft::{detrend, dft_harmonics, normalize, resample};
use super::{MarketHarmonics, MarketMappingMode};
use crate::params::{MARKET_AMPLITUDE_SCALE, MAX_HARMONICS};

/// Divisor floor for DFT amplitude normalisation.
const MIN_DFT_AMPLITUDE: f64 = 0.001;

/// Non-negative successive differences of a cumulative series. Negative
/// or non-finite cumulative values count as 0, and a decrease (a data
/// correction) yields a zero delta.
pub fn volume_deltas(cumulative: &[f64]) -> Vec<f64> {
    let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    cumulative
        .windows(2)
        .map(|w| (clean(w[1]) - clean(w[0])).max(0.0))
        .collect()
}

/// Every `step`-th delta with `step = max(1, floor(len / 60))`; slots
/// past the end read as 0.
pub fn sample_deltas(deltas: &[f64]) -> Vec<f64> {
    let step = (deltas.len() / MAX_HARMONICS).max(1);
    (0..MAX_HARMONICS)
        .map(|i| deltas.get(i * step).copied().unwrap_or(0.0))
        .collect()
}

fn volume_amplitudes(cumulative: &[f64]) -> Vec<f64> {
    let mut sampled = sample_deltas(&volume_deltas(cumulative));
    let max = sampled.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        normalize(&mut sampled, MARKET_AMPLITUDE_SCALE, max);
    }
    sampled
}

/// Detrended DFT of a resampled price series, amplitudes scaled to
/// `[0, 80]`.
fn price_spectrum(prices: &[f64]) -> MarketHarmonics {
    let detrended = detrend(&resample(prices, MAX_HARMONICS));
    let (mut harmonics, phases) = dft_harmonics(&detrended);
    normalize(&mut harmonics, MARKET_AMPLITUDE_SCALE, MIN_DFT_AMPLITUDE);
    MarketHarmonics { harmonics, phases }
}

/// Price direction as phase: consecutive differences of the resampled
/// series scaled into `[-π, π]`. The first node has no predecessor and
/// gets 0.
fn direction_phases(prices: &[f64]) -> Vec<f64> {
    let resampled = resample(prices, MAX_HARMONICS);
    let diffs: Vec<f64> = std::iter::once(0.0)
        .chain(resampled.windows(2).map(|w| w[1] - w[0]))
        .collect();
    let max_abs = diffs.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
    if max_abs == 0.0 {
        return vec![0.0; MAX_HARMONICS];
    }
    diffs.iter().map(|d| d / max_abs * PI).collect()
}

/// Map a series pair under `mode`, or `None` when the series the mode
/// reads is empty.
pub fn try_map(
    mode: MarketMappingMode,
    prices: &[f64],
    cumulative_volumes: &[f64],
) -> Option<MarketHarmonics> {
    match mode {
        MarketMappingMode::VolumeDelta => {
            if cumulative_volumes.is_empty() {
                return None;
            }
            Some(MarketHarmonics {
                harmonics: volume_amplitudes(cumulative_volumes),
                phases: vec![0.0; MAX_HARMONICS],
            })
        }
        MarketMappingMode::PriceFft | MarketMappingMode::StockDaily => {
            if prices.is_empty() {
                return None;
            }
            Some(price_spectrum(prices))
        }
        MarketMappingMode::MultiDim => {
            if prices.is_empty() || cumulative_volumes.is_empty() {
                return None;
            }
            Some(MarketHarmonics {
                harmonics: volume_amplitudes(cumulative_volumes),
                phases: direction_phases(prices),
            })
        }
    }
}

/// Map a series pair under `mode`. Missing input degrades to the mode's
/// flat fallback.
pub fn map(mode: MarketMappingMode, prices: &[f64], cumulative_volumes: &[f64]) -> MarketHarmonics {
    match try_map(mode, prices, cumulative_volumes) {
        Some(out) => {
            log::debug!(
                "mapped {} prices / {} volumes with {}",
                prices.len(),
                cumulative_volumes.len(),
                mode
            );
            out
        }
        None => {
            log::warn!("no market input for {mode}, using neutral fallback");
            MarketHarmonics::fallback(mode)
        }
    }
}
