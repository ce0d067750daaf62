//! Per-project dashboards and the add-device dialog.
//!
//! The project type decides the layout: water-pump projects get telemetry
//! counts and tank columns, every other type the generic device table.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::app_state::AppState;
use crate::domain::{Project, ProjectType};
use crate::error::DashboardError;
use crate::format::{Notice, NoticeCode, notice_from_query};
use crate::web::forms::{AddDeviceForm, IdQuery};
use crate::web::views::{
    AddDeviceDialog, DashboardRow, ListState, OverviewView, SmartLightPage, WaterPumpPage,
};
use crate::web::{href, render_status};

async fn load_project(state: &AppState, project_id: &str) -> Result<Project, DashboardError> {
    state
        .project_service
        .get_project(project_id)
        .await?
        .ok_or_else(|| DashboardError::ProjectNotFound(project_id.to_string()))
}

/// Renders the dashboard of `project` with `dialog` embedded.
///
/// Device and telemetry failures are shown inline; only the project itself
/// and template rendering can fail the response.
///
/// # Errors
///
/// Returns [`DashboardError::Template`] if the page fails to render.
pub(crate) async fn dashboard_response(
    state: &AppState,
    project: &Project,
    notice: Option<Notice>,
    dialog: AddDeviceDialog,
    status: StatusCode,
) -> Result<Response, DashboardError> {
    use askama::Template;

    let devices = ListState::from_result(
        state
            .device_service
            .devices_for_project(&project.project_id)
            .await
            .map(|devices| devices.iter().map(DashboardRow::from).collect()),
        "Error loading devices",
    );
    let dialog = dialog.render()?;

    if project.project_type == ProjectType::WaterPump {
        let (overview, overview_error) =
            match state.project_service.telemetry_overview(project).await {
                Ok(overview) => (overview.as_ref().map(OverviewView::from), None),
                Err(e) => (None, Some(format!("Error loading telemetry: {e}"))),
            };
        let page = WaterPumpPage {
            nav: "projects",
            notice,
            project_id: project.project_id.clone(),
            project_name: project.project_name.clone(),
            overview,
            overview_error,
            devices,
            dialog,
            telemetry_href: href("/project/telemetry", &[("id", &project.project_id)]),
        };
        return render_status(status, &page);
    }

    let page = SmartLightPage {
        nav: "projects",
        notice,
        project_id: project.project_id.clone(),
        project_name: project.project_name.clone(),
        type_title: project.project_type.title(),
        devices,
        dialog,
    };
    render_status(status, &page)
}

/// Loads `project_id` and renders its dashboard; the dialog stays closed
/// unless one is given.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] for an unknown project.
pub(crate) async fn dashboard_for(
    state: &AppState,
    project_id: &str,
    notice: Option<Notice>,
    dialog: Option<AddDeviceDialog>,
    status: StatusCode,
) -> Result<Response, DashboardError> {
    let project = load_project(state, project_id).await?;
    let dialog = dialog.unwrap_or_else(|| AddDeviceDialog::closed(&project));
    dashboard_response(state, &project, notice, dialog, status).await
}

/// `GET /project?id=`: Project dashboard.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] for an unknown project.
pub async fn project_dashboard(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, DashboardError> {
    let Some(project_id) = query.id() else {
        return Ok(Redirect::to("/projects").into_response());
    };
    let notice = notice_from_query(query.notice.as_deref());
    dashboard_for(&state, project_id, notice, None, StatusCode::OK).await
}

/// `POST /project/devices?id=`: Register a device from the dialog.
///
/// On failure the dashboard is re-rendered with the dialog open and the
/// operator's input intact.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] for an unknown project.
pub async fn add_device(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Form(form): Form<AddDeviceForm>,
) -> Result<Response, DashboardError> {
    let Some(project_id) = query.id() else {
        return Ok(Redirect::to("/projects").into_response());
    };
    let project = load_project(&state, project_id).await?;

    let (status, message) = match form.to_new_device(&project) {
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        Ok(device) => match state.device_service.add_device(&device).await {
            Ok(_) => {
                let target = href(
                    "/project",
                    &[("id", project_id), ("notice", NoticeCode::DeviceAdded.as_str())],
                );
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => (e.status_code(), e.to_string()),
        },
    };

    let notice = Notice::error(format!("Error adding device: {message}"));
    let dialog = form.reopen(&project);
    dashboard_response(&state, &project, Some(notice), dialog, status).await
}

/// Dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/project", get(project_dashboard))
        .route("/project/devices", post(add_device))
}
