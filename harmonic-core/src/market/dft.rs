//! Resampling, detrending and the direct DFT used by the price mappings.
//!
//! The DFT is evaluated directly for `k = 1..=N` over `N = 60` nodes:
//!
//! ```text
//! X_k     = Σ_n d[n] · e^{-2πi·k·n/N}   (re = Σ d cos, im = -Σ d sin)
//! amp_k   = |X_k|
//! phase_k = atan2(re, -im)
//! ```
//!
//! The phase convention makes `amp_k · sin(k·φ + phase_k)` reproduce the
//! detrended series at `φ = 2πn/N`. Real input aliases bin `k` onto
//! `N - k`, so a pure tone shows up in both.

use std::f64::consts::TAU;

use num_complex::Complex64;

/// Nearest-index resample to `nodes` values: `idx = floor(i/nodes · len)`.
/// Missing or non-finite entries fall back to the last value of the
/// series (or 0 for an empty one).
pub fn resample(series: &[f64], nodes: usize) -> Vec<f64> {
    let len = series.len();
    let last = series.last().copied().filter(|v| v.is_finite()).unwrap_or(0.0);
    (0..nodes)
        .map(|i| {
            let idx = (i * len) / nodes.max(1);
            series
                .get(idx)
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(last)
        })
        .collect()
}

/// Subtract the mean.
pub fn detrend(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|v| v - mean).collect()
}

/// Bin `k` of the DFT of `samples`.
pub fn dft_bin(samples: &[f64], k: usize) -> Complex64 {
    let n_total = samples.len() as f64;
    samples
        .iter()
        .enumerate()
        .map(|(n, &d)| d * Complex64::from_polar(1.0, -TAU * (k * n) as f64 / n_total))
        .sum()
}

/// Raw amplitudes and sine-basis phases for `k = 1..=samples.len()`.
pub fn dft_harmonics(samples: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (1..=samples.len())
        .map(|k| {
            let x = dft_bin(samples, k);
            (x.norm(), x.re.atan2(-x.im))
        })
        .unzip()
}

/// Scale `values` so the largest becomes `scale`. `floor` guards the
/// divisor against an all-zero input.
pub fn normalize(values: &mut [f64], scale: f64, floor: f64) {
    let max = values.iter().copied().fold(floor, f64::max);
    for v in values.iter_mut() {
        *v = *v / max * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_stretches_short_series() {
        let out = resample(&[1.0, 2.0, 3.0], 6);
        assert_eq!(out, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn resample_replaces_bad_values_with_last() {
        let out = resample(&[f64::NAN, 2.0, 7.0], 3);
        assert_eq!(out, vec![7.0, 2.0, 7.0]);
        assert_eq!(resample(&[], 4), vec![0.0; 4]);
    }

    #[test]
    fn detrend_removes_mean() {
        let d = detrend(&[1.0, 2.0, 3.0, 6.0]);
        assert!(d.iter().sum::<f64>().abs() < 1e-12);
        assert_eq!(d[3], 3.0);
    }

    #[test]
    fn cosine_has_quarter_turn_phase() {
        // cos(kx) = sin(kx + π/2)
        let samples: Vec<f64> = (0..60).map(|n| (TAU * 3.0 * n as f64 / 60.0).cos()).collect();
        let (amps, phases) = dft_harmonics(&samples);
        assert!((amps[2] - 30.0).abs() < 1e-9);
        assert!((phases[2] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn normalize_floor_protects_zero_input() {
        let mut v = vec![0.0; 4];
        normalize(&mut v, 80.0, 0.001);
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
