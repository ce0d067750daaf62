//! Device rows and the patches/inserts applied to them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectType, lenient_or_default, lenient_timestamp};

/// Release channel of a device's firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Stable channel.
    #[default]
    Regular,
    /// Early-access channel.
    Beta,
}

impl Role {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Beta => "beta",
        }
    }

    /// Badge style used in device tables.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Regular => "badge-secondary",
            Self::Beta => "badge-warning",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "beta" => Ok(Self::Beta),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Physical shape of a water tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TankShape {
    /// Upright cylinder; width is the diameter.
    Cylinder,
    /// Rectangular box.
    Rectangular,
}

impl TankShape {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cylinder => "cylinder",
            Self::Rectangular => "rectangular",
        }
    }
}

impl fmt::Display for TankShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TankShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cylinder" => Ok(Self::Cylinder),
            "rectangular" => Ok(Self::Rectangular),
            other => Err(format!("unknown tank shape: {other}")),
        }
    }
}

/// Binary actuator state, stored as `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SwitchState {
    /// `0`.
    #[default]
    Off,
    /// `1`.
    On,
}

impl SwitchState {
    /// The opposite state.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    /// Stored integer value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Control label (`ON`/`OFF`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }

    /// Control style.
    #[must_use]
    pub const fn button_class(self) -> &'static str {
        match self {
            Self::Off => "btn-secondary",
            Self::On => "btn-success",
        }
    }
}

impl TryFrom<i64> for SwitchState {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(format!("manual_switch must be 0 or 1, got {other}")),
        }
    }
}

impl From<SwitchState> for i64 {
    fn from(state: SwitchState) -> Self {
        state.as_i64()
    }
}

impl FromStr for SwitchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("manual_switch must be 0 or 1, got {s}"))?;
        Self::try_from(value)
    }
}

/// Owning project columns embedded into a device row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project display name.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Project type.
    #[serde(default)]
    pub project_type: Option<ProjectType>,
}

/// A device row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device identifier (immutable).
    pub device_id: String,
    /// Owning project (immutable).
    #[serde(default)]
    pub project_id: Option<String>,
    /// Firmware channel.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub role: Role,
    /// Whether firmware updates install automatically.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub auto_update: bool,
    /// Last acknowledged switch state; anything but `1` reads as off.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub manual_switch: SwitchState,
    /// Tank shape, if a tank is attached; unknown shapes read as `None`.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub tank_shape: Option<TankShape>,
    /// Tank height in centimeters.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub height_cm: Option<f64>,
    /// Tank width (diameter for cylinders) in centimeters.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub width_cm: Option<f64>,
    /// Tank length in centimeters.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub length_cm: Option<f64>,
    /// Maximum inflow in liters per minute.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub max_flow_in: Option<f64>,
    /// Maximum outflow in liters per minute.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub max_flow_out: Option<f64>,
    /// Fill percentage under which the pump starts.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub pump_lower_threshold: Option<f64>,
    /// Fill percentage at which the pump stops.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub pump_upper_threshold: Option<f64>,
    /// Last modification time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded owning project, when requested.
    #[serde(default, rename = "projects", skip_serializing)]
    pub project: Option<ProjectRef>,
}

impl Device {
    /// Display name of the owning project, if embedded.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.project_name.as_deref())
    }
}

/// Default lower pump threshold, in percent.
pub const DEFAULT_PUMP_LOWER_THRESHOLD: f64 = 15.0;

/// Default upper pump threshold, in percent.
pub const DEFAULT_PUMP_UPPER_THRESHOLD: f64 = 100.0;

/// Patch written by the device edit form. Identity columns are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceUpdate {
    /// Firmware channel.
    pub role: Role,
    /// Automatic firmware updates.
    pub auto_update: bool,
    /// Tank shape (`null` clears it).
    pub tank_shape: Option<TankShape>,
    /// Tank height (`null` clears it).
    pub height_cm: Option<f64>,
    /// Tank width (`null` clears it).
    pub width_cm: Option<f64>,
    /// Tank length (`null` clears it).
    pub length_cm: Option<f64>,
    /// Maximum inflow.
    pub max_flow_in: f64,
    /// Maximum outflow.
    pub max_flow_out: f64,
    /// Lower pump threshold.
    pub pump_lower_threshold: f64,
    /// Upper pump threshold.
    pub pump_upper_threshold: f64,
    /// Modification time, refreshed on every save.
    pub updated_at: DateTime<Utc>,
}

/// Row inserted when registering a device under a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDevice {
    /// Unique device identifier.
    pub device_id: String,
    /// Owning project.
    pub project_id: String,
    /// Firmware channel.
    pub role: Role,
    /// Automatic firmware updates.
    pub auto_update: bool,
    /// Tank shape (water-pump projects only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_shape: Option<TankShape>,
    /// Tank height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Tank width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_cm: Option<f64>,
    /// Tank length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_cm: Option<f64>,
}
