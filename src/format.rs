//! Display formatting, lenient numeric input and toast notices.

use chrono::{DateTime, Utc};

use crate::domain::Device;

/// Placeholder shown for absent values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Formats a timestamp as `Jan 2, 2024, 10:30` (UTC), or `N/A`.
#[must_use]
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |t| t.format("%b %-d, %Y, %H:%M").to_string(),
    )
}

/// `✓` or `✗`.
#[must_use]
pub const fn flag(value: bool) -> &'static str {
    if value { "✓" } else { "✗" }
}

/// `1 device`, `2 devices`.
#[must_use]
pub fn count_label(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Tank column of the device list: `cylinder (200cm)` or `N/A`.
#[must_use]
pub fn tank_summary(device: &Device) -> String {
    match (device.tank_shape, device.height_cm) {
        (Some(shape), Some(height)) => format!("{shape} ({height}cm)"),
        (Some(shape), None) => shape.to_string(),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}

/// Dimensions column of the water-pump dashboard: `H: 200cm W: 100cm`.
#[must_use]
pub fn dimensions(device: &Device) -> String {
    let parts: Vec<String> = [("H", device.height_cm), ("W", device.width_cm), ("L", device.length_cm)]
        .into_iter()
        .filter_map(|(axis, value)| value.map(|v| format!("{axis}: {v}cm")))
        .collect();
    parts.join(" ")
}

/// Value attribute for a numeric input; empty when absent.
#[must_use]
pub fn input_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Parses a numeric form input. Blank, unparsable and non-finite input
/// yields `None`.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a numeric form input, substituting `default` when it is not a
/// finite number.
#[must_use]
pub fn number_or(raw: &str, default: f64) -> f64 {
    parse_number(raw).unwrap_or(default)
}

/// Kind of toast notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Completed mutation.
    Success,
    /// Failed action.
    Error,
}

/// A transient notification shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Styling.
    pub kind: NoticeKind,
    /// Text shown to the operator.
    pub message: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// CSS class of the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "notification notification-success",
            NoticeKind::Error => "notification notification-error",
        }
    }
}

/// Success notices carried across a redirect as `?notice=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCode {
    /// Project inserted.
    ProjectCreated,
    /// Project updated.
    ProjectUpdated,
    /// Project deleted.
    ProjectDeleted,
    /// Device registered.
    DeviceAdded,
    /// Device deleted.
    DeviceDeleted,
    /// Device updated.
    DeviceUpdated,
}

impl NoticeCode {
    const ALL: [Self; 6] = [
        Self::ProjectCreated,
        Self::ProjectUpdated,
        Self::ProjectDeleted,
        Self::DeviceAdded,
        Self::DeviceDeleted,
        Self::DeviceUpdated,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::ProjectUpdated => "project_updated",
            Self::ProjectDeleted => "project_deleted",
            Self::DeviceAdded => "device_added",
            Self::DeviceDeleted => "device_deleted",
            Self::DeviceUpdated => "device_updated",
        }
    }

    /// Looks up a code; unknown codes are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == raw)
    }

    /// The notice this code stands for.
    #[must_use]
    pub fn notice(self) -> Notice {
        Notice::success(match self {
            Self::ProjectCreated => "Project created successfully",
            Self::ProjectUpdated => "Project updated successfully",
            Self::ProjectDeleted => "Project deleted successfully",
            Self::DeviceAdded => "Device added successfully",
            Self::DeviceDeleted => "Device deleted successfully",
            Self::DeviceUpdated => "Device updated successfully",
        })
    }
}

/// Resolves the optional `notice` query parameter.
#[must_use]
pub fn notice_from_query(raw: Option<&str>) -> Option<Notice> {
    raw.and_then(NoticeCode::parse).map(NoticeCode::notice)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TankShape;
    use chrono::TimeZone;
    use serde_json::json;

    fn bare_device() -> Device {
        let Ok(device) = serde_json::from_value(json!({"device_id": "WP01-D001"})) else {
            panic!("device row must deserialize");
        };
        device
    }

    #[test]
    fn timestamp_formats_or_falls_back() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).single();
        assert_eq!(format_timestamp(ts), "Jan 2, 2024, 10:30");
        assert_eq!(format_timestamp(None), "N/A");
    }

    #[test]
    fn tank_summary_shows_shape_and_height() {
        let mut d = bare_device();
        assert_eq!(tank_summary(&d), "N/A");
        d.tank_shape = Some(TankShape::Cylinder);
        d.height_cm = Some(200.0);
        assert_eq!(tank_summary(&d), "cylinder (200cm)");
    }

    #[test]
    fn dimensions_skip_missing_axes() {
        let mut d = bare_device();
        d.height_cm = Some(200.0);
        d.width_cm = Some(100.5);
        assert_eq!(dimensions(&d), "H: 200cm W: 100.5cm");
    }

    #[test]
    fn number_parsing_is_lenient() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert!((number_or("x", 15.0) - 15.0).abs() < f64::EPSILON);
        assert!(number_or("0", 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn notice_codes_resolve_and_unknown_are_ignored() {
        assert_eq!(
            notice_from_query(Some("device_added")),
            Some(Notice::success("Device added successfully"))
        );
        assert_eq!(notice_from_query(Some("bogus")), None);
        assert_eq!(notice_from_query(None), None);
    }

    #[test]
    fn count_label_pluralizes() {
        assert_eq!(count_label(1, "device"), "1 device");
        assert_eq!(count_label(0, "device"), "0 devices");
    }
}
