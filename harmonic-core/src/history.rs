//! Snapshot history
//!
//! Append-only log of computed market harmonics, keyed by an increasing
//! id and deduplicated on market time. Rows keep the harmonic arrays as
//! JSON text, which is the shape the timeline host stores and serves:
//!
//! ```json
//! {"id": 3, "timestamp": "2024-05-02T01:05:00Z", "marketTime": "09:05:00",
//!  "mode": "price-fft", "harmonicsJson": "[...]", "phasesJson": "[...]"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::MarketSample;
use crate::market::{MarketHarmonics, MarketMappingMode};
use crate::params::TIMELINE_LIMIT;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no snapshot with id {0}")]
    NotFound(u64),
    #[error("snapshot {id} has a malformed {field} column: {source}")]
    Corrupt {
        id: u64,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate snapshot id {0}")]
    DuplicateId(u64),
    #[error("snapshot id {0} leaves no room for a successor")]
    IdOverflow(u64),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub id: u64,
    /// Wall-clock time of the sync, ISO 8601.
    pub timestamp: String,
    /// Market clock label; unique across the log.
    pub market_time: String,
    pub mode: MarketMappingMode,
    pub harmonics_json: String,
    pub phases_json: String,
}

impl SnapshotRecord {
    pub fn to_sample(&self) -> Result<MarketSample, HistoryError> {
        let corrupt = |field: &'static str| {
            move |source: serde_json::Error| HistoryError::Corrupt {
                id: self.id,
                field,
                source,
            }
        };
        Ok(MarketSample {
            harmonics: serde_json::from_str(&self.harmonics_json).map_err(corrupt("harmonics"))?,
            phases: serde_json::from_str(&self.phases_json).map_err(corrupt("phases"))?,
            market_time: self.market_time.clone(),
        })
    }
}

/// Row of the timeline view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: u64,
    pub timestamp: String,
    pub market_time: String,
    pub mode: MarketMappingMode,
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotHistory {
    records: Vec<SnapshotRecord>,
    next_id: u64,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_market_time(&self, market_time: &str) -> bool {
        self.records.iter().any(|r| r.market_time == market_time)
    }

    /// Append a snapshot. Returns the new id, or `None` when a row for
    /// `market_time` already exists.
    pub fn record(
        &mut self,
        timestamp: &str,
        market_time: &str,
        mode: MarketMappingMode,
        harmonics: &MarketHarmonics,
    ) -> Result<Option<u64>, HistoryError> {
        if self.contains_market_time(market_time) {
            log::debug!("snapshot for {market_time} already recorded");
            return Ok(None);
        }
        let id = self.next_id.max(1);
        let next_id = id.checked_add(1).ok_or(HistoryError::IdOverflow(id))?;
        self.records.push(SnapshotRecord {
            id,
            timestamp: timestamp.to_string(),
            market_time: market_time.to_string(),
            mode,
            harmonics_json: serde_json::to_string(&harmonics.harmonics)?,
            phases_json: serde_json::to_string(&harmonics.phases)?,
        });
        self.next_id = next_id;
        Ok(Some(id))
    }

    pub fn get(&self, id: u64) -> Option<&SnapshotRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Most recent first, at most `limit` entries.
    pub fn timeline(&self, limit: usize) -> Vec<TimelineEntry> {
        self.records
            .iter()
            .rev()
            .take(limit)
            .map(|r| TimelineEntry {
                id: r.id,
                timestamp: r.timestamp.clone(),
                market_time: r.market_time.clone(),
                mode: r.mode,
            })
            .collect()
    }

    pub fn recent(&self) -> Vec<TimelineEntry> {
        self.timeline(TIMELINE_LIMIT)
    }

    /// Decode snapshot `id` for replay.
    pub fn load(&self, id: u64) -> Result<MarketSample, HistoryError> {
        self.get(id).ok_or(HistoryError::NotFound(id))?.to_sample()
    }

    /// All rows in ascending id order.
    pub fn export_json(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Replace the log with a previous export. Returns the row count.
    pub fn import_json(&mut self, json: &str) -> Result<usize, HistoryError> {
        let mut records: Vec<SnapshotRecord> = serde_json::from_str(json)?;
        records.sort_by_key(|r| r.id);
        if let Some(w) = records.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(HistoryError::DuplicateId(w[0].id));
        }
        let next_id = match records.last() {
            Some(r) => r.id.checked_add(1).ok_or(HistoryError::IdOverflow(r.id))?,
            None => 1,
        };
        self.next_id = next_id;
        self.records = records;
        Ok(self.records.len())
    }
}
