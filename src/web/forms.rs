//! Form and query-string DTOs, and their conversion into domain writes.
//!
//! Numeric inputs are coerced leniently: unparsable input becomes the
//! field's documented default instead of an error.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::device::{DEFAULT_PUMP_LOWER_THRESHOLD, DEFAULT_PUMP_UPPER_THRESHOLD};
use crate::domain::{
    DeviceUpdate, NewDevice, NewProject, Project, ProjectChanges, ProjectType, Role, TankShape,
};
use crate::format::{number_or, parse_number};
use crate::web::field_editor::FieldEditor;
use crate::web::views::{AddDeviceDialog, DeviceEditPage};

/// `?id=<id>&notice=<code>` on detail pages.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    /// Entity identifier; absent means redirect to the parent list.
    pub id: Option<String>,
    /// Success notice code.
    pub notice: Option<String>,
}

impl IdQuery {
    /// The identifier, if present and non-blank.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// `?notice=<code>` on list pages.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    /// Success notice code.
    pub notice: Option<String>,
}

/// Manual switch toggle post.
#[derive(Debug, Deserialize)]
pub struct SwitchForm {
    /// Last acknowledged state (`0` or `1`).
    #[serde(default)]
    pub current: String,
}

fn role_from(raw: &str) -> Result<Role, String> {
    match raw.trim() {
        "" => Ok(Role::default()),
        other => other.parse(),
    }
}

fn shape_from(raw: &str) -> Result<Option<TankShape>, String> {
    match raw.trim() {
        "" => Ok(None),
        other => other.parse().map(Some),
    }
}

/// Device edit post.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeviceEditForm {
    /// Role select.
    pub role: String,
    /// Checkbox; present when checked.
    pub auto_update: Option<String>,
    /// Shape select; empty for none.
    pub tank_shape: String,
    /// Height input.
    pub height_cm: String,
    /// Width input.
    pub width_cm: String,
    /// Length input.
    pub length_cm: String,
    /// Max inflow input.
    pub max_flow_in: String,
    /// Max outflow input.
    pub max_flow_out: String,
    /// Lower threshold input.
    pub pump_lower_threshold: String,
    /// Upper threshold input.
    pub pump_upper_threshold: String,
}

impl DeviceEditForm {
    /// Coerces the inputs into a patch stamped with `now`.
    ///
    /// Dimensions fall back to null, flows to `0` (negative flows too),
    /// thresholds to `15`/`100`.
    ///
    /// # Errors
    ///
    /// Returns a message for an unknown role or tank shape.
    pub fn to_update(&self, now: DateTime<Utc>) -> Result<DeviceUpdate, String> {
        Ok(DeviceUpdate {
            role: role_from(&self.role)?,
            auto_update: self.auto_update.is_some(),
            tank_shape: shape_from(&self.tank_shape)?,
            height_cm: parse_number(&self.height_cm),
            width_cm: parse_number(&self.width_cm),
            length_cm: parse_number(&self.length_cm),
            max_flow_in: number_or(&self.max_flow_in, 0.0).max(0.0),
            max_flow_out: number_or(&self.max_flow_out, 0.0).max(0.0),
            pump_lower_threshold: number_or(&self.pump_lower_threshold, DEFAULT_PUMP_LOWER_THRESHOLD),
            pump_upper_threshold: number_or(&self.pump_upper_threshold, DEFAULT_PUMP_UPPER_THRESHOLD),
            updated_at: now,
        })
    }

    /// Copies the submitted input into the form page.
    pub fn refill(&self, page: &mut DeviceEditPage) {
        page.role.clone_from(&self.role);
        page.auto_update = self.auto_update.is_some();
        page.tank_shape.clone_from(&self.tank_shape);
        page.height_cm.clone_from(&self.height_cm);
        page.width_cm.clone_from(&self.width_cm);
        page.length_cm.clone_from(&self.length_cm);
        page.max_flow_in.clone_from(&self.max_flow_in);
        page.max_flow_out.clone_from(&self.max_flow_out);
        page.pump_lower_threshold.clone_from(&self.pump_lower_threshold);
        page.pump_upper_threshold.clone_from(&self.pump_upper_threshold);
    }
}

/// Device delete post from a project dashboard.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteDeviceForm {
    /// Device to delete.
    pub device_id: String,
    /// Dashboard to return to.
    pub project_id: String,
}

/// Add-device dialog post.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddDeviceForm {
    /// Identifier input (required).
    pub device_id: String,
    /// Role select.
    pub role: String,
    /// Checkbox; present when checked.
    pub auto_update: Option<String>,
    /// Shape select.
    pub tank_shape: String,
    /// Height input.
    pub height_cm: String,
    /// Width input.
    pub width_cm: String,
    /// Length input.
    pub length_cm: String,
}

impl AddDeviceForm {
    /// Builds the insert for `project`. Tank attributes are only taken for
    /// projects with tanks; blank ones are omitted.
    ///
    /// # Errors
    ///
    /// Returns a message when the identifier is blank or a select value is
    /// unknown.
    pub fn to_new_device(&self, project: &Project) -> Result<NewDevice, String> {
        let device_id = self.device_id.trim();
        if device_id.is_empty() {
            return Err("Device ID is required".to_string());
        }
        let has_tank = project.project_type.has_tank();
        Ok(NewDevice {
            device_id: device_id.to_string(),
            project_id: project.project_id.clone(),
            role: role_from(&self.role)?,
            auto_update: self.auto_update.is_some(),
            tank_shape: if has_tank { shape_from(&self.tank_shape)? } else { None },
            height_cm: has_tank.then(|| parse_number(&self.height_cm)).flatten(),
            width_cm: has_tank.then(|| parse_number(&self.width_cm)).flatten(),
            length_cm: has_tank.then(|| parse_number(&self.length_cm)).flatten(),
        })
    }

    /// The dialog re-opened with this input.
    #[must_use]
    pub fn reopen(self, project: &Project) -> AddDeviceDialog {
        AddDeviceDialog {
            open: true,
            device_id: self.device_id,
            role: self.role,
            auto_update: self.auto_update.is_some(),
            tank_shape: self.tank_shape,
            height_cm: self.height_cm,
            width_cm: self.width_cm,
            length_cm: self.length_cm,
            ..AddDeviceDialog::closed(project)
        }
    }
}

/// What a project form submission asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Validate and write.
    Save,
    /// Append a blank field fragment and re-render.
    AddField,
    /// Remove the fragment with this key and re-render.
    RemoveField(String),
}

impl Intent {
    /// Parses the `intent` button value; anything unrecognized saves.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "add_field" => Self::AddField,
            other => other
                .strip_prefix("remove_field:")
                .map_or(Self::Save, |key| Self::RemoveField(key.to_string())),
        }
    }
}

/// Project create/edit post, including the custom-field editor.
#[derive(Debug, Clone)]
pub struct ProjectForm {
    /// Identifier input (create only).
    pub project_id: String,
    /// Name input.
    pub project_name: String,
    /// Type select (wire name).
    pub project_type: String,
    /// ML checkbox.
    pub ml_enabled: bool,
    /// Submit intent.
    pub intent: Intent,
    /// Editor rebuilt from the `cf[...]` inputs.
    pub editor: FieldEditor,
}

impl ProjectForm {
    /// Parses submitted pairs; editor keys use `prefix`.
    #[must_use]
    pub fn from_pairs(prefix: &'static str, pairs: &[(String, String)]) -> Self {
        let value = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        Self {
            project_id: value("project_id").unwrap_or_default(),
            project_name: value("project_name").unwrap_or_default(),
            project_type: value("project_type").unwrap_or_default(),
            ml_enabled: value("ml_enabled").is_some(),
            intent: Intent::parse(&value("intent").unwrap_or_default()),
            editor: FieldEditor::from_form(prefix, pairs),
        }
    }

    /// Form pre-populated from a stored project.
    #[must_use]
    pub fn from_project(prefix: &'static str, project: &Project) -> Self {
        Self {
            project_id: project.project_id.clone(),
            project_name: project.project_name.clone(),
            project_type: project.project_type.as_str().to_string(),
            ml_enabled: project.ml_enabled,
            intent: Intent::Save,
            editor: FieldEditor::from_fields(prefix, &project.custom_fields),
        }
    }

    /// Selected type, if any.
    #[must_use]
    pub fn selected_type(&self) -> Option<ProjectType> {
        let raw = self.project_type.trim();
        (!raw.is_empty()).then(|| ProjectType::from(raw.to_string()))
    }

    /// Validated attributes for an update.
    ///
    /// # Errors
    ///
    /// Returns a message when the name or type is blank, or a custom field
    /// lacks a name or label.
    pub fn to_changes(&self) -> Result<ProjectChanges, String> {
        let project_name = self.project_name.trim();
        if project_name.is_empty() {
            return Err("Project name is required".to_string());
        }
        let project_type = self
            .selected_type()
            .ok_or_else(|| "Project type is required".to_string())?;
        Ok(ProjectChanges {
            project_name: project_name.to_string(),
            project_type,
            ml_enabled: self.ml_enabled,
            custom_fields: self.editor.validated()?,
        })
    }

    /// Validated row for an insert.
    ///
    /// # Errors
    ///
    /// As [`ProjectForm::to_changes`], plus a blank identifier.
    pub fn to_new_project(&self) -> Result<NewProject, String> {
        let project_id = self.project_id.trim();
        if project_id.is_empty() {
            return Err("Project ID is required".to_string());
        }
        Ok(NewProject {
            project_id: project_id.to_string(),
            changes: self.to_changes()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::web::field_editor::CREATE_PREFIX;
    use serde_json::json;

    fn water_pump() -> Project {
        let Ok(project) = serde_json::from_value(json!({
            "project_id": "WP01", "project_name": "Tanks", "project_type": "water_pump"
        })) else {
            panic!("project row must deserialize");
        };
        project
    }

    fn edit_form(height: &str) -> DeviceEditForm {
        DeviceEditForm {
            role: "beta".to_string(),
            auto_update: Some("on".to_string()),
            tank_shape: "cylinder".to_string(),
            height_cm: height.to_string(),
            width_cm: "100".to_string(),
            length_cm: String::new(),
            max_flow_in: "-3".to_string(),
            max_flow_out: "oops".to_string(),
            pump_lower_threshold: "0".to_string(),
            pump_upper_threshold: "bad".to_string(),
        }
    }

    #[test]
    fn non_numeric_height_becomes_null() {
        let Ok(update) = edit_form("tall").to_update(Utc::now()) else {
            panic!("update rejected");
        };
        assert_eq!(update.height_cm, None);
        assert_eq!(update.width_cm, Some(100.0));
        assert_eq!(update.length_cm, None);
        let Ok(value) = serde_json::to_value(&update) else {
            panic!("serialization failed");
        };
        assert_eq!(value["height_cm"], json!(null));
    }

    #[test]
    fn limits_fall_back_to_defaults() {
        let Ok(update) = edit_form("200").to_update(Utc::now()) else {
            panic!("update rejected");
        };
        assert!(update.max_flow_in.abs() < f64::EPSILON);
        assert!(update.max_flow_out.abs() < f64::EPSILON);
        assert!(update.pump_lower_threshold.abs() < f64::EPSILON);
        assert!((update.pump_upper_threshold - 100.0).abs() < f64::EPSILON);
        assert_eq!(update.role, Role::Beta);
        assert!(update.auto_update);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let mut form = edit_form("200");
        form.tank_shape = "sphere".to_string();
        assert!(form.to_update(Utc::now()).is_err());
    }

    #[test]
    fn add_device_requires_identifier() {
        let form = AddDeviceForm {
            device_id: "  ".to_string(),
            ..AddDeviceForm::default()
        };
        assert_eq!(
            form.to_new_device(&water_pump()),
            Err("Device ID is required".to_string())
        );
    }

    #[test]
    fn tank_attributes_only_for_water_pump() {
        let form = AddDeviceForm {
            device_id: "X-1".to_string(),
            tank_shape: "rectangular".to_string(),
            height_cm: "200".to_string(),
            ..AddDeviceForm::default()
        };
        let Ok(device) = form.to_new_device(&water_pump()) else {
            panic!("device rejected");
        };
        assert_eq!(device.tank_shape, Some(TankShape::Rectangular));
        assert_eq!(device.height_cm, Some(200.0));

        let mut light = water_pump();
        light.project_type = ProjectType::SmartLight;
        let Ok(device) = form.to_new_device(&light) else {
            panic!("device rejected");
        };
        assert_eq!(device.tank_shape, None);
        assert_eq!(device.height_cm, None);
    }

    #[test]
    fn intents_parse() {
        assert_eq!(Intent::parse("save"), Intent::Save);
        assert_eq!(Intent::parse("add_field"), Intent::AddField);
        assert_eq!(
            Intent::parse("remove_field:field-3"),
            Intent::RemoveField("field-3".to_string())
        );
        assert_eq!(Intent::parse(""), Intent::Save);
    }

    #[test]
    fn project_form_validates_required_attributes() {
        let pairs = vec![
            ("project_id".to_string(), "WP03".to_string()),
            ("project_name".to_string(), " ".to_string()),
            ("project_type".to_string(), "water_pump".to_string()),
        ];
        let form = ProjectForm::from_pairs(CREATE_PREFIX, &pairs);
        assert_eq!(
            form.to_new_project(),
            Err("Project name is required".to_string())
        );
    }
}
