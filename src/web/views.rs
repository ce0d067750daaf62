//! Page and partial templates.
//!
//! Every page extends `base.html`, which reads `nav` (highlighted entry) and
//! `notice` (optional toast). Rows are flattened into display strings here so
//! templates only print and loop.

use std::fmt::Display;

use askama::Template;

use crate::domain::{
    CustomField, Device, FieldType, Project, ProjectSummary, ProjectType, SwitchState,
    TelemetryOverview, TelemetryTable,
};
use crate::format::{self, Notice};
use crate::web::field_editor::FieldFragment;
use crate::web::href;

/// Result of a collection fetch: an error to show inline, or the rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    /// The fetch failed; the message replaces the content region.
    Failed(String),
    /// The fetch succeeded (possibly with zero rows).
    Loaded(Vec<T>),
}

impl<T> ListState<T> {
    /// Wraps a fetch result, prefixing failures with `context`.
    pub fn from_result<E: Display>(result: Result<Vec<T>, E>, context: &str) -> Self {
        match result {
            Ok(rows) => Self::Loaded(rows),
            Err(e) => Self::Failed(format!("{context}: {e}")),
        }
    }

    /// Failure message, if the fetch failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loaded(_) => None,
        }
    }

    /// Loaded rows (empty on failure).
    #[must_use]
    pub fn rows(&self) -> &[T] {
        match self {
            Self::Failed(_) => &[],
            Self::Loaded(rows) => rows,
        }
    }

    /// Whether the fetch succeeded with zero rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Loaded(rows) if rows.is_empty())
    }
}

/// Manual switch control; replaced in place after a toggle.
#[derive(Debug, Template)]
#[template(path = "partials/switch.html")]
pub struct SwitchControl {
    /// Device the control belongs to (also its DOM id suffix).
    pub device_id: String,
    /// Toggle endpoint.
    pub action: String,
    /// Last acknowledged state.
    pub state: SwitchState,
}

impl SwitchControl {
    /// Control for `device_id` in `state`.
    #[must_use]
    pub fn new(device_id: &str, state: SwitchState) -> Self {
        Self {
            device_id: device_id.to_string(),
            action: href(&format!("/devices/{device_id}/switch"), &[]),
            state,
        }
    }
}

/// One row of the device list.
#[derive(Debug, Clone)]
pub struct DeviceRow {
    /// Device identifier.
    pub device_id: String,
    /// Owning project's name or `N/A`.
    pub project_name: String,
    /// Role text.
    pub role: &'static str,
    /// Role badge style.
    pub role_class: &'static str,
    /// `✓`/`✗`.
    pub auto_update: &'static str,
    /// Rendered switch control.
    pub switch: String,
    /// Tank summary.
    pub tank: String,
    /// Last update.
    pub updated: String,
    /// Device telemetry page.
    pub telemetry_href: String,
    /// Device edit page.
    pub edit_href: String,
}

impl DeviceRow {
    /// Flattens a device.
    ///
    /// # Errors
    ///
    /// Returns an [`askama::Error`] if the switch control fails to render.
    pub fn new(device: &Device) -> Result<Self, askama::Error> {
        let id = device.device_id.as_str();
        Ok(Self {
            device_id: id.to_string(),
            project_name: device
                .project_name()
                .unwrap_or(format::NOT_AVAILABLE)
                .to_string(),
            role: device.role.as_str(),
            role_class: device.role.badge_class(),
            auto_update: format::flag(device.auto_update),
            switch: SwitchControl::new(id, device.manual_switch).render()?,
            tank: format::tank_summary(device),
            updated: format::format_timestamp(device.updated_at),
            telemetry_href: href("/device/telemetry", &[("id", id)]),
            edit_href: href("/device/edit", &[("id", id)]),
        })
    }
}

/// `GET /devices`.
#[derive(Debug, Template)]
#[template(path = "devices.html")]
pub struct DevicesPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Device rows or the load failure.
    pub devices: ListState<DeviceRow>,
}

/// Device edit form; values are kept as typed so a failed save re-renders
/// the operator's input.
#[derive(Debug, Template)]
#[template(path = "device_edit.html")]
pub struct DeviceEditPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Form target.
    pub action: String,
    /// Device identifier (read-only).
    pub device_id: String,
    /// Owning project name (read-only).
    pub project_name: String,
    /// `regular` or `beta`.
    pub role: String,
    /// Auto update checkbox.
    pub auto_update: bool,
    /// `cylinder`, `rectangular` or empty.
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

impl DeviceEditPage {
    /// Form pre-populated from a stored device.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        use crate::domain::device::{DEFAULT_PUMP_LOWER_THRESHOLD, DEFAULT_PUMP_UPPER_THRESHOLD};

        Self {
            nav: "devices",
            notice: None,
            action: href("/device/edit", &[("id", &device.device_id)]),
            device_id: device.device_id.clone(),
            project_name: device
                .project_name()
                .unwrap_or(format::NOT_AVAILABLE)
                .to_string(),
            role: device.role.as_str().to_string(),
            auto_update: device.auto_update,
            tank_shape: device
                .tank_shape
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            height_cm: format::input_value(device.height_cm),
            width_cm: format::input_value(device.width_cm),
            length_cm: format::input_value(device.length_cm),
            max_flow_in: format::input_value(Some(device.max_flow_in.unwrap_or(0.0))),
            max_flow_out: format::input_value(Some(device.max_flow_out.unwrap_or(0.0))),
            pump_lower_threshold: format::input_value(Some(
                device
                    .pump_lower_threshold
                    .unwrap_or(DEFAULT_PUMP_LOWER_THRESHOLD),
            )),
            pump_upper_threshold: format::input_value(Some(
                device
                    .pump_upper_threshold
                    .unwrap_or(DEFAULT_PUMP_UPPER_THRESHOLD),
            )),
        }
    }
}

/// One card of the project grid.
#[derive(Debug, Clone)]
pub struct ProjectCard {
    /// Project identifier.
    pub project_id: String,
    /// Display name.
    pub name: String,
    /// Type badge text.
    pub badge: String,
    /// Whether the ML badge and button show.
    pub ml_enabled: bool,
    /// `N devices`.
    pub devices: String,
    /// Creation time.
    pub created: String,
    /// Dashboard page.
    pub dashboard_href: String,
    /// Edit page.
    pub edit_href: String,
    /// Delete endpoint.
    pub delete_href: String,
    /// ML script page.
    pub ml_href: String,
}

impl From<&ProjectSummary> for ProjectCard {
    fn from(summary: &ProjectSummary) -> Self {
        let project = &summary.project;
        let id = project.project_id.as_str();
        Self {
            project_id: id.to_string(),
            name: project.project_name.clone(),
            badge: project.project_type.badge(),
            ml_enabled: project.ml_enabled,
            devices: summary.device_count.map_or_else(
                || format::NOT_AVAILABLE.to_string(),
                |count| format::count_label(count, "device"),
            ),
            created: format::format_timestamp(project.created_at),
            dashboard_href: href("/project", &[("id", id)]),
            edit_href: href("/project/edit", &[("id", id)]),
            delete_href: href("/project/delete", &[("id", id)]),
            ml_href: href("/project/ml-script", &[("id", id)]),
        }
    }
}

/// `GET /projects`.
#[derive(Debug, Template)]
#[template(path = "projects.html")]
pub struct ProjectsPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Cards or the load failure.
    pub projects: ListState<ProjectCard>,
}

/// Choice in a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value.
    pub value: String,
    /// Shown text.
    pub label: String,
    /// Pre-selected.
    pub selected: bool,
}

impl SelectOption {
    /// Project type choices with `current` selected; an unknown current
    /// type is offered too so editing keeps it.
    #[must_use]
    pub fn project_types(current: Option<&ProjectType>) -> Vec<Self> {
        let mut types: Vec<ProjectType> = ProjectType::KNOWN.to_vec();
        if let Some(other @ ProjectType::Other(_)) = current {
            types.push(other.clone());
        }
        types
            .into_iter()
            .map(|t| Self {
                value: t.as_str().to_string(),
                label: t.title(),
                selected: current == Some(&t),
            })
            .collect()
    }

    /// Field type choices with `current` selected.
    #[must_use]
    pub fn field_types(current: FieldType) -> Vec<Self> {
        FieldType::ALL
            .into_iter()
            .map(|t| Self {
                value: t.as_str().to_string(),
                label: t.label().to_string(),
                selected: t == current,
            })
            .collect()
    }
}

/// One custom-field block of the editor.
#[derive(Debug, Template)]
#[template(path = "partials/field.html")]
pub struct FieldFragmentView {
    /// Fragment key; also the DOM id.
    pub key: String,
    /// Label input.
    pub label: String,
    /// Name input.
    pub name: String,
    /// Type choices.
    pub types: Vec<SelectOption>,
    /// Required checkbox.
    pub required: bool,
    /// Choices input (kept even when hidden).
    pub options: String,
    /// Whether the choices input is visible.
    pub show_options: bool,
}

impl From<&FieldFragment> for FieldFragmentView {
    fn from(fragment: &FieldFragment) -> Self {
        Self {
            key: fragment.key.clone(),
            label: fragment.label.clone(),
            name: fragment.name.clone(),
            types: SelectOption::field_types(fragment.field_type),
            required: fragment.required,
            options: fragment.options.clone(),
            show_options: fragment.field_type == FieldType::Select,
        }
    }
}

/// Project create/edit form.
#[derive(Debug, Template)]
#[template(path = "project_form.html")]
pub struct ProjectFormPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// `Create New Project` or `Edit Project`.
    pub heading: &'static str,
    /// Form target.
    pub action: String,
    /// Whether the identifier is editable (create only).
    pub creating: bool,
    /// Identifier input.
    pub project_id: String,
    /// Name input.
    pub project_name: String,
    /// Type choices.
    pub types: Vec<SelectOption>,
    /// ML checkbox.
    pub ml_enabled: bool,
    /// Rendered custom-field fragments, in order.
    pub fields: Vec<String>,
    /// Submit button text.
    pub submit_label: &'static str,
}

/// Dashboard device row.
#[derive(Debug, Clone)]
pub struct DashboardRow {
    /// Device identifier.
    pub device_id: String,
    /// Owning project (for delete redirects).
    pub project_id: String,
    /// Role text.
    pub role: &'static str,
    /// Role badge style.
    pub role_class: &'static str,
    /// `✓`/`✗`.
    pub auto_update: &'static str,
    /// Tank shape or `N/A`.
    pub tank_shape: String,
    /// `H: ..cm W: ..cm`.
    pub dimensions: String,
    /// Last update.
    pub updated: String,
    /// Device telemetry page.
    pub telemetry_href: String,
    /// Device edit page.
    pub edit_href: String,
}

impl From<&Device> for DashboardRow {
    fn from(device: &Device) -> Self {
        let id = device.device_id.as_str();
        Self {
            device_id: id.to_string(),
            project_id: device.project_id.clone().unwrap_or_default(),
            role: device.role.as_str(),
            role_class: device.role.badge_class(),
            auto_update: format::flag(device.auto_update),
            tank_shape: device.tank_shape.map_or_else(
                || format::NOT_AVAILABLE.to_string(),
                |s| s.as_str().to_string(),
            ),
            dimensions: format::dimensions(device),
            updated: format::format_timestamp(device.updated_at),
            telemetry_href: href("/device/telemetry", &[("id", id)]),
            edit_href: href("/device/edit", &[("id", id)]),
        }
    }
}

/// Add-device dialog, kept open with the operator's input after a failed
/// insert.
#[derive(Debug, Default, Template)]
#[template(path = "partials/add_device.html")]
pub struct AddDeviceDialog {
    /// Form target.
    pub action: String,
    /// Open on page load.
    pub open: bool,
    /// Whether tank inputs show (water-pump projects).
    pub has_tank: bool,
    /// Identifier placeholder.
    pub placeholder: &'static str,
    /// Identifier input.
    pub device_id: String,
    /// Role select.
    pub role: String,
    /// Auto update checkbox.
    pub auto_update: bool,
    /// Shape select.
    pub tank_shape: String,
    /// Height input.
    pub height_cm: String,
    /// Width input.
    pub width_cm: String,
    /// Length input.
    pub length_cm: String,
}

impl AddDeviceDialog {
    /// Closed, empty dialog for `project`.
    #[must_use]
    pub fn closed(project: &Project) -> Self {
        Self {
            action: href("/project/devices", &[("id", &project.project_id)]),
            has_tank: project.project_type.has_tank(),
            placeholder: project.project_type.device_id_placeholder(),
            role: "regular".to_string(),
            ..Self::default()
        }
    }
}

/// Counts shown in the water-pump header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewView {
    /// Total samples.
    pub total_samples: u64,
    /// Trained models.
    pub model_count: u64,
    /// Newest sample time.
    pub latest: String,
}

impl From<&TelemetryOverview> for OverviewView {
    fn from(overview: &TelemetryOverview) -> Self {
        Self {
            total_samples: overview.total_samples,
            model_count: overview.model_count,
            latest: format::format_timestamp(overview.latest()),
        }
    }
}

/// `GET /project?id=` for water-pump projects.
#[derive(Debug, Template)]
#[template(path = "water_pump.html")]
pub struct WaterPumpPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Project identifier.
    pub project_id: String,
    /// Display name.
    pub project_name: String,
    /// Counts, or `None` when the telemetry read failed.
    pub overview: Option<OverviewView>,
    /// Telemetry read failure.
    pub overview_error: Option<String>,
    /// Device rows or the load failure.
    pub devices: ListState<DashboardRow>,
    /// Rendered add-device dialog.
    pub dialog: String,
    /// Project telemetry page.
    pub telemetry_href: String,
}

/// `GET /project?id=` for smart-light and other projects.
#[derive(Debug, Template)]
#[template(path = "smart_light.html")]
pub struct SmartLightPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Project identifier.
    pub project_id: String,
    /// Display name.
    pub project_name: String,
    /// Type badge.
    pub type_title: String,
    /// Device rows or the load failure.
    pub devices: ListState<DashboardRow>,
    /// Rendered add-device dialog.
    pub dialog: String,
}

/// Recent telemetry of a project or a device.
#[derive(Debug, Template)]
#[template(path = "telemetry.html")]
pub struct TelemetryPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast.
    pub notice: Option<Notice>,
    /// Page heading.
    pub heading: String,
    /// Line under the heading.
    pub subtitle: String,
    /// Back link.
    pub back_href: String,
    /// Back link text.
    pub back_label: &'static str,
    /// Sample cap applied to the read.
    pub limit: u32,
    /// Read failure.
    pub failure: Option<String>,
    /// Samples, or `None` when this kind of project records none.
    pub table: Option<TelemetryTable>,
}

/// Renders the editor's fragments in order.
///
/// # Errors
///
/// Returns an [`askama::Error`] if a fragment fails to render.
pub fn render_fragments(fragments: &[FieldFragment]) -> Result<Vec<String>, askama::Error> {
    fragments
        .iter()
        .map(|f| FieldFragmentView::from(f).render())
        .collect()
}

/// Joins descriptor choices back into the comma-separated input.
#[must_use]
pub fn options_input(field: &CustomField) -> String {
    field.options.as_deref().unwrap_or_default().join(", ")
}
