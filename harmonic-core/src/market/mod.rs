//! Market data → harmonics
//!
//! Market series (index prices, cumulative traded value, daily closes)
//! are turned into full 60-slot amplitude/phase arrays. The mappings run
//! on data refresh only, never per tick; the result is handed to the
//! bank as a [`MarketSample`] and eased in by the smoothing step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::MarketSample;
use crate::params::{MARKET_FALLBACK_AMPLITUDE, MAX_HARMONICS, STOCK_FALLBACK_AMPLITUDE};

pub mod dft;
pub mod feed;
pub mod mapping;

pub use feed::FeedError;
pub use mapping::map;

/// How a market series drives the harmonic bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketMappingMode {
    /// Traded-value deltas as amplitudes, zero phase.
    VolumeDelta,
    /// DFT of the detrended intraday index price.
    PriceFft,
    /// Volume-delta amplitudes with price-direction phases.
    MultiDim,
    /// DFT of a stock's daily closes.
    StockDaily,
}

impl MarketMappingMode {
    pub const ALL: [MarketMappingMode; 4] = [
        MarketMappingMode::VolumeDelta,
        MarketMappingMode::PriceFft,
        MarketMappingMode::MultiDim,
        MarketMappingMode::StockDaily,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarketMappingMode::VolumeDelta => "volume-delta",
            MarketMappingMode::PriceFft => "price-fft",
            MarketMappingMode::MultiDim => "multi-dim",
            MarketMappingMode::StockDaily => "stock-daily",
        }
    }

    /// Flat amplitude used when the mode's input is unavailable.
    pub fn fallback_amplitude(self) -> f64 {
        match self {
            MarketMappingMode::StockDaily => STOCK_FALLBACK_AMPLITUDE,
            _ => MARKET_FALLBACK_AMPLITUDE,
        }
    }
}

impl Default for MarketMappingMode {
    fn default() -> Self {
        MarketMappingMode::VolumeDelta
    }
}

impl fmt::Display for MarketMappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown market mapping mode `{0}`")]
pub struct UnknownMode(pub String);

impl FromStr for MarketMappingMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Output of a market mapping: exactly `MAX_HARMONICS` entries each.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketHarmonics {
    pub harmonics: Vec<f64>,
    pub phases: Vec<f64>,
}

impl MarketHarmonics {
    pub fn zeros() -> Self {
        Self {
            harmonics: vec![0.0; MAX_HARMONICS],
            phases: vec![0.0; MAX_HARMONICS],
        }
    }

    /// Neutral flat set substituted for unavailable input.
    pub fn fallback(mode: MarketMappingMode) -> Self {
        Self {
            harmonics: vec![mode.fallback_amplitude(); MAX_HARMONICS],
            phases: vec![0.0; MAX_HARMONICS],
        }
    }

    pub fn into_sample(self, market_time: impl Into<String>) -> MarketSample {
        MarketSample {
            harmonics: self.harmonics,
            phases: self.phases,
            market_time: market_time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for mode in MarketMappingMode::ALL {
            assert_eq!(mode.label().parse::<MarketMappingMode>(), Ok(mode));
            let json = serde_json::to_string(&mode).expect("serialize");
            assert_eq!(json, format!("\"{}\"", mode.label()));
        }
        assert!("fft".parse::<MarketMappingMode>().is_err());
    }

    #[test]
    fn fallback_levels() {
        let m = MarketHarmonics::fallback(MarketMappingMode::PriceFft);
        assert!(m.harmonics.iter().all(|&a| a == 10.0));
        let s = MarketHarmonics::fallback(MarketMappingMode::StockDaily);
        assert!(s.harmonics.iter().all(|&a| a == 5.0));
        assert!(s.phases.iter().all(|&p| p == 0.0));
        assert_eq!(s.harmonics.len(), MAX_HARMONICS);
    }
}
