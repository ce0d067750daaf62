//! Projects: named groupings of devices sharing a type and a field schema.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomField, lenient_timestamp, null_as_default};

/// Kind of project. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectType {
    /// Tank level monitoring and pump control.
    WaterPump,
    /// Lighting control.
    SmartLight,
    /// Any other kind registered in the store.
    Other(String),
}

impl ProjectType {
    /// Kinds offered when creating a project.
    pub const KNOWN: [Self; 2] = [Self::WaterPump, Self::SmartLight];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WaterPump => "water_pump",
            Self::SmartLight => "smart_light",
            Self::Other(name) => name,
        }
    }

    /// Badge text: the wire name with underscores as spaces.
    #[must_use]
    pub fn badge(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Title-cased label for headers and selects.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::WaterPump => "Water Pump".to_string(),
            Self::SmartLight => "Smart Light".to_string(),
            Self::Other(name) => name.replace('_', " "),
        }
    }

    /// Table holding this kind's telemetry samples, if it records any.
    #[must_use]
    pub fn telemetry_table(&self) -> Option<&'static str> {
        match self {
            Self::WaterPump => Some("wp_samples"),
            Self::SmartLight | Self::Other(_) => None,
        }
    }

    /// Whether devices of this kind carry tank geometry.
    #[must_use]
    pub fn has_tank(&self) -> bool {
        matches!(self, Self::WaterPump)
    }

    /// Example device identifier shown in the add-device dialog.
    #[must_use]
    pub fn device_id_placeholder(&self) -> &'static str {
        match self {
            Self::WaterPump => "WP01-D004",
            Self::SmartLight | Self::Other(_) => "SL01-D001",
        }
    }
}

impl From<String> for ProjectType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "water_pump" => Self::WaterPump,
            "smart_light" => Self::SmartLight,
            _ => Self::Other(value),
        }
    }
}

impl From<ProjectType> for String {
    fn from(value: ProjectType) -> Self {
        match value {
            ProjectType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Operator-supplied unique identifier (e.g. `WP03`).
    pub project_id: String,
    /// Display name.
    pub project_name: String,
    /// Project kind.
    pub project_type: ProjectType,
    /// Whether an ML script is attached.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ml_enabled: bool,
    /// Ordered custom-field schema.
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_fields: Vec<CustomField>,
    /// Creation time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A project annotated with the number of devices it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    /// The project.
    pub project: Project,
    /// Number of devices whose `project_id` is this project; `None` when
    /// the count could not be read.
    pub device_count: Option<u64>,
}

/// Mutable project attributes, written on create and edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectChanges {
    /// Display name.
    pub project_name: String,
    /// Project kind.
    pub project_type: ProjectType,
    /// ML script enablement.
    pub ml_enabled: bool,
    /// Ordered custom-field schema.
    pub custom_fields: Vec<CustomField>,
}

/// Row inserted when creating a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    /// Operator-supplied identifier.
    pub project_id: String,
    /// Remaining attributes.
    #[serde(flatten)]
    pub changes: ProjectChanges,
}
