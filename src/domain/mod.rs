//! Domain layer: devices, projects, custom-field descriptors and telemetry.
//!
//! Rows arrive from the backend as JSON; these types give them shape. Column
//! names match the store's schema so that rows deserialize directly.

pub mod custom_field;
pub mod device;
pub mod project;
pub mod telemetry;

pub use custom_field::{CustomField, FieldType};
pub use device::{Device, DeviceUpdate, NewDevice, ProjectRef, Role, SwitchState, TankShape};
pub use project::{NewProject, Project, ProjectChanges, ProjectSummary, ProjectType};
pub use telemetry::{TelemetryOverview, TelemetrySample, TelemetryTable};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes `null` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserializes a column that must not reject its row: `null` or an
/// out-of-domain value reads as `T::default()`.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(&raw).unwrap_or_else(|e| {
        tracing::warn!(value = %raw, error = %e, "unrecognized column value, using default");
        T::default()
    }))
}

/// Parses RFC 3339, naive date-times (taken as UTC) and bare dates.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Deserializes an optional timestamp leniently; unparsable text reads as
/// `None`.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_timestamp))
}
