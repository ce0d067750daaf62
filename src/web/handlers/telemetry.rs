//! Recent telemetry samples of a project or a single device.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use crate::app_state::AppState;
use crate::domain::{ProjectType, TelemetrySample, TelemetryTable};
use crate::error::DashboardError;
use crate::format;
use crate::web::forms::IdQuery;
use crate::web::views::TelemetryPage;
use crate::web::{href, render};

/// Splits a sample read into the page's failure and table slots.
fn table_state(
    result: Result<Option<Vec<TelemetrySample>>, DashboardError>,
) -> (Option<String>, Option<TelemetryTable>) {
    match result {
        Ok(samples) => (None, samples.as_deref().map(TelemetryTable::from_samples)),
        Err(e) => (Some(format!("Error loading telemetry: {e}")), None),
    }
}

/// `GET /project/telemetry?id=`: Newest samples recorded for a project.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] for an unknown project.
pub async fn project_telemetry(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, DashboardError> {
    let Some(project_id) = query.id() else {
        return Ok(Redirect::to("/projects").into_response());
    };
    let project = state
        .project_service
        .get_project(project_id)
        .await?
        .ok_or_else(|| DashboardError::ProjectNotFound(project_id.to_string()))?;

    let result = state
        .project_service
        .recent_samples(&project.project_type, "project_id", project_id)
        .await;
    let (failure, table) = table_state(result);

    let page = TelemetryPage {
        nav: "projects",
        notice: None,
        heading: format!("{} Telemetry", project.project_name),
        subtitle: format!("{} · {}", project.project_id, project.project_type.title()),
        back_href: href("/project", &[("id", project_id)]),
        back_label: "Back to dashboard",
        limit: state.project_service.telemetry_limit(),
        failure,
        table,
    };
    Ok(render(&page)?.into_response())
}

/// `GET /device/telemetry?id=`: Newest samples reported by one device.
///
/// # Errors
///
/// Returns [`DashboardError::DeviceNotFound`] for an unknown device.
pub async fn device_telemetry(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, DashboardError> {
    let Some(device_id) = query.id() else {
        return Ok(Redirect::to("/devices").into_response());
    };
    let device = state
        .device_service
        .get_device(device_id)
        .await?
        .ok_or_else(|| DashboardError::DeviceNotFound(device_id.to_string()))?;

    // Devices without an embedded project type fall back to "no telemetry".
    let project_type = device
        .project
        .as_ref()
        .and_then(|p| p.project_type.clone())
        .unwrap_or_else(|| ProjectType::Other(String::new()));
    let result = state
        .project_service
        .recent_samples(&project_type, "device_id", device_id)
        .await;
    let (failure, table) = table_state(result);

    let page = TelemetryPage {
        nav: "devices",
        notice: None,
        heading: format!("{device_id} Telemetry"),
        subtitle: device.project_name().unwrap_or(format::NOT_AVAILABLE).to_string(),
        back_href: "/devices".to_string(),
        back_label: "Back to devices",
        limit: state.project_service.telemetry_limit(),
        failure,
        table,
    };
    Ok(render(&page)?.into_response())
}

/// Telemetry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/project/telemetry", get(project_telemetry))
        .route("/device/telemetry", get(device_telemetry))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::StatusCode;

    use crate::web::handlers::test_support::{app, fleet, get, send};

    #[tokio::test]
    async fn project_samples_newest_first() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/project/telemetry?id=WP01")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Tank Farm Telemetry"));
        let (Some(newer), Some(older)) = (
            reply.body.find("2024-03-01T11:00:00Z"),
            reply.body.find("2024-03-01T10:00:00Z"),
        ) else {
            panic!("samples missing");
        };
        assert!(newer < older);
        assert!(reply.body.contains(">water_level<"));
        assert!(reply.body.contains(">41.5<"));
    }

    #[tokio::test]
    async fn device_samples_are_filtered() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/device/telemetry?id=WP01-D004")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("2024-03-01T11:00:00Z"));
        assert!(!reply.body.contains("2024-03-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn smart_light_has_no_telemetry_table() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/project/telemetry?id=SL01")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("No telemetry is recorded for this project type"));
    }

    #[tokio::test]
    async fn read_failure_is_inline() {
        let backend = fleet().await;
        backend.set_unavailable("wp_samples", true).await;
        let reply = send(app(&backend), get("/device/telemetry?id=WP01-D001")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Error loading telemetry"));
    }

    #[tokio::test]
    async fn missing_ids_redirect_to_lists() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/project/telemetry")).await;
        assert_eq!(reply.location(), Some("/projects"));
        let reply = send(app(&backend), get("/device/telemetry?id=")).await;
        assert_eq!(reply.location(), Some("/devices"));
        let reply = send(app(&backend), get("/device/telemetry?id=nope")).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }
}
