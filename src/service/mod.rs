//! Service layer: one backend round trip per mutation.
//!
//! [`DeviceService`] covers device reads, edits, registration, deletion and
//! the manual switch. [`ProjectService`] covers projects, their device
//! counts and read-only telemetry.

pub mod device_service;
pub mod project_service;

pub use device_service::DeviceService;
pub use project_service::ProjectService;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;

/// Decodes backend rows into typed records. A row that does not decode is
/// logged and skipped so the rest of the listing still renders.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match <T as Deserialize<'_>>::deserialize(&row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(row = %row, error = %e, "skipping undecodable row");
                None
            }
        })
        .collect()
}

/// Decodes the first row, if any.
pub(crate) fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, BackendError> {
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(|e| BackendError::Decode(e.to_string())))
        .transpose()
}

/// Serializes a write payload.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Value, BackendError> {
    serde_json::to_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}
