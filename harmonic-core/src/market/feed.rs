//! Exchange report parsing
//!
//! Reports arrive as `{"stat": "OK", "data": [[...], ...]}` where numeric
//! cells are strings with thousands separators (`"17,234.56"`). A cell
//! that does not parse (`"--"`) reads as NaN and is cleaned by the mapping
//! helpers. Shape problems surface as [`FeedError`]; the `map_*` helpers turn any error
//! into the mode's neutral fallback so a bad response never reaches the
//! render loop.

use serde_json::Value;
use thiserror::Error;

use super::{mapping, MarketHarmonics, MarketMappingMode};

/// Index report: price column.
pub const INDEX_PRICE_COLUMN: usize = 1;
/// 5-minute volume report: cumulative traded value column.
pub const VOLUME_CUMULATIVE_COLUMN: usize = 7;
/// Stock daily report: closing price column.
pub const STOCK_CLOSE_COLUMN: usize = 6;
/// Stock daily report: traded volume column.
pub const STOCK_VOLUME_COLUMN: usize = 1;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report status is {0:?}, expected \"OK\"")]
    Status(Option<String>),
    #[error("report has no `data` table")]
    MissingData,
    #[error("row {row} has no column {column}")]
    ShortRow { row: usize, column: usize },
}

/// Daily closes and volumes of one stock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockDaily {
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
}

/// Parse a numeric cell, accepting JSON numbers and comma-grouped strings.
pub fn parse_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn rows(report: &Value) -> Result<&[Value], FeedError> {
    let stat = report.get("stat").and_then(Value::as_str);
    if stat != Some("OK") {
        return Err(FeedError::Status(stat.map(str::to_string)));
    }
    report
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(FeedError::MissingData)
}

fn column(rows: &[Value], column: usize) -> Result<Vec<f64>, FeedError> {
    rows.iter()
        .enumerate()
        .map(|(row, r)| {
            let cell = r
                .as_array()
                .and_then(|cells| cells.get(column))
                .ok_or(FeedError::ShortRow { row, column })?;
            Ok(parse_number(cell).unwrap_or(f64::NAN))
        })
        .collect()
}

pub fn parse_index_prices(json: &str) -> Result<Vec<f64>, FeedError> {
    let report: Value = serde_json::from_str(json)?;
    column(rows(&report)?, INDEX_PRICE_COLUMN)
}

/// Cumulative traded value; negative readings count as 0.
pub fn parse_cumulative_volume(json: &str) -> Result<Vec<f64>, FeedError> {
    let report: Value = serde_json::from_str(json)?;
    let values = column(rows(&report)?, VOLUME_CUMULATIVE_COLUMN)?;
    Ok(values.into_iter().map(|v| v.max(0.0)).collect())
}

pub fn parse_stock_daily(json: &str) -> Result<StockDaily, FeedError> {
    let report: Value = serde_json::from_str(json)?;
    let rows = rows(&report)?;
    Ok(StockDaily {
        closes: column(rows, STOCK_CLOSE_COLUMN)?,
        volumes: column(rows, STOCK_VOLUME_COLUMN)?,
    })
}

/// Map an index report and a volume report. `StockDaily` reads
/// `index_json` as a stock daily report and ignores `volume_json`.
pub fn try_map_feeds(
    mode: MarketMappingMode,
    index_json: &str,
    volume_json: &str,
) -> Result<MarketHarmonics, FeedError> {
    if mode == MarketMappingMode::StockDaily {
        return try_map_stock_daily(index_json);
    }
    let prices = parse_index_prices(index_json)?;
    let volumes = parse_cumulative_volume(volume_json)?;
    Ok(mapping::map(mode, &prices, &volumes))
}

pub fn try_map_stock_daily(json: &str) -> Result<MarketHarmonics, FeedError> {
    let daily = parse_stock_daily(json)?;
    Ok(mapping::map(
        MarketMappingMode::StockDaily,
        &daily.closes,
        &daily.volumes,
    ))
}

/// [`try_map_feeds`], degrading to the neutral fallback on any error.
pub fn map_feeds(mode: MarketMappingMode, index_json: &str, volume_json: &str) -> MarketHarmonics {
    try_map_feeds(mode, index_json, volume_json).unwrap_or_else(|e| {
        log::warn!("market feed rejected ({mode}): {e}");
        MarketHarmonics::fallback(mode)
    })
}

/// [`try_map_stock_daily`], degrading to the neutral fallback on any error.
pub fn map_stock_daily(json: &str) -> MarketHarmonics {
    try_map_stock_daily(json).unwrap_or_else(|e| {
        log::warn!("stock daily feed rejected: {e}");
        MarketHarmonics::fallback(MarketMappingMode::StockDaily)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_grouping() {
        assert_eq!(parse_number(&Value::from("17,234.56")), Some(17234.56));
        assert_eq!(parse_number(&Value::from(3)), Some(3.0));
        assert_eq!(parse_number(&Value::from("--")), None);
        assert_eq!(parse_number(&Value::Null), None);
    }

    #[test]
    fn status_must_be_ok() {
        let err = parse_index_prices(r#"{"stat":"no data"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Status(Some(ref s)) if s == "no data"));
        let err = parse_index_prices(r#"{"stat":"OK"}"#).unwrap_err();
        assert!(matches!(err, FeedError::MissingData));
    }

    #[test]
    fn short_rows_are_reported() {
        let err = parse_cumulative_volume(r#"{"stat":"OK","data":[["09:00","1"]]}"#).unwrap_err();
        assert!(matches!(err, FeedError::ShortRow { row: 0, column: 7 }));
    }

    #[test]
    fn negative_volume_clamps() {
        let json = r#"{"stat":"OK","data":[
            ["09:00","","","","","","","-12"],
            ["09:05","","","","","","","1,200"]
        ]}"#;
        assert_eq!(parse_cumulative_volume(json).expect("parse"), vec![0.0, 1200.0]);
    }

    #[test]
    fn garbage_falls_back() {
        let out = map_feeds(MarketMappingMode::MultiDim, "not json", "{}");
        assert_eq!(out, MarketHarmonics::fallback(MarketMappingMode::MultiDim));
        let out = map_stock_daily(r#"{"stat":"OK","data":[["x","1"]]}"#);
        assert_eq!(out, MarketHarmonics::fallback(MarketMappingMode::StockDaily));
    }

    #[test]
    fn unparsable_cells_read_as_nan() {
        let json = r#"{"stat":"OK","data":[
            ["09:00","","","","","","","--"],
            ["09:05","","","","","","","1,200"]
        ]}"#;
        assert_eq!(parse_cumulative_volume(json).expect("parse"), vec![0.0, 1200.0]);

        let prices = parse_index_prices(r#"{"stat":"OK","data":[["09:00","100"],["09:05","--"]]}"#)
            .expect("parse");
        assert_eq!(prices[0], 100.0);
        assert!(prices[1].is_nan());
    }
}
