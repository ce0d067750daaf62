//! Read-only telemetry rows.
//!
//! Sample tables differ per project type, so a sample is kept as a plain
//! JSON object and only the timestamp column is interpreted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::parse_timestamp;

/// Timestamp column shared by every sample table.
pub const TIMESTAMP_COLUMN: &str = "ts_utc";

/// One telemetry row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetrySample(pub Map<String, Value>);

impl TelemetrySample {
    /// Sample time, if the row carries a parsable `ts_utc`.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.0
            .get(TIMESTAMP_COLUMN)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }

    /// Reporting device, if the row names one.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.0.get("device_id").and_then(Value::as_str)
    }
}

/// Counts and recent rows shown on a project dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryOverview {
    /// Total samples recorded for the project.
    pub total_samples: u64,
    /// Most recent samples, newest first.
    pub recent: Vec<TelemetrySample>,
    /// Number of trained models for the project.
    pub model_count: u64,
}

impl TelemetryOverview {
    /// Time of the newest sample.
    #[must_use]
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.recent.first().and_then(TelemetrySample::timestamp)
    }
}

/// Samples flattened into display cells.
///
/// Columns are the union of all sample keys with `ts_utc` first and the rest
/// in lexical order, so the same input always yields the same table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryTable {
    /// Column headers.
    pub columns: Vec<String>,
    /// One row of cells per sample, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl TelemetryTable {
    /// Builds the table from samples, preserving their order.
    #[must_use]
    pub fn from_samples(samples: &[TelemetrySample]) -> Self {
        let keys: BTreeSet<&str> = samples
            .iter()
            .flat_map(|s| s.0.keys().map(String::as_str))
            .collect();
        let mut columns: Vec<String> = Vec::with_capacity(keys.len());
        if keys.contains(TIMESTAMP_COLUMN) {
            columns.push(TIMESTAMP_COLUMN.to_string());
        }
        columns.extend(
            keys.into_iter()
                .filter(|k| *k != TIMESTAMP_COLUMN)
                .map(str::to_string),
        );

        let rows = samples
            .iter()
            .map(|sample| {
                columns
                    .iter()
                    .map(|col| cell(sample.0.get(col)))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
