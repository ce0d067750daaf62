//! Device handlers: list, manual switch, edit and delete.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;

use crate::app_state::AppState;
use crate::domain::SwitchState;
use crate::error::DashboardError;
use crate::format::{Notice, NoticeCode, notice_from_query};
use crate::web::forms::{DeleteDeviceForm, DeviceEditForm, IdQuery, NoticeQuery, SwitchForm};
use crate::web::handlers::dashboards;
use crate::web::views::{DeviceEditPage, DeviceRow, DevicesPage, ListState, SwitchControl};
use crate::web::{FRAGMENT_HEADER, href, render, render_status};

/// Builds the device list page. A failed read becomes the inline error
/// state, not an error response.
async fn devices_page(
    state: &AppState,
    notice: Option<Notice>,
) -> Result<DevicesPage, DashboardError> {
    let devices = match state.device_service.list_devices().await {
        Ok(devices) => ListState::Loaded(
            devices
                .iter()
                .map(DeviceRow::new)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Err(e) => ListState::Failed(format!("Error loading devices: {e}")),
    };
    Ok(DevicesPage {
        nav: "devices",
        notice,
        devices,
    })
}

/// `GET /devices`: All devices, most recently updated first.
///
/// # Errors
///
/// Returns [`DashboardError`] only if the page fails to render.
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    let page = devices_page(&state, notice_from_query(query.notice.as_deref())).await?;
    render(&page)
}

/// `POST /devices/{id}/switch`: Flip the manual switch through the remote
/// function.
///
/// In-page requests (carrying the fragment header) get the updated control
/// on success and a plain-text 502 on failure. Other requests are
/// redirected back to the list, or see it re-rendered with the error.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidRequest`] if `current` is not `0`/`1`.
pub async fn toggle_switch(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<SwitchForm>,
) -> Result<Response, DashboardError> {
    let current: SwitchState = form.current.parse().map_err(DashboardError::InvalidRequest)?;
    let in_page = headers.contains_key(FRAGMENT_HEADER);

    match state.device_service.toggle_switch(&device_id, current).await {
        Ok(next) if in_page => Ok(render(&SwitchControl::new(&device_id, next))?.into_response()),
        Ok(_) => Ok(Redirect::to("/devices").into_response()),
        Err(e) if in_page => {
            Ok((StatusCode::BAD_GATEWAY, format!("Failed to toggle switch: {e}")).into_response())
        }
        Err(e) => {
            let notice = Notice::error(format!("Error toggling switch: {e}"));
            let page = devices_page(&state, Some(notice)).await?;
            render_status(StatusCode::BAD_GATEWAY, &page)
        }
    }
}

/// `GET /device/edit?id=`: Edit form pre-populated from the device.
///
/// # Errors
///
/// Returns [`DashboardError::DeviceNotFound`] for an unknown device, or
/// [`DashboardError::Backend`] if the read fails.
pub async fn edit_device(
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
    Ok(render(&DeviceEditPage::from_device(&device))?.into_response())
}

/// `POST /device/edit?id=`: Save the edit form.
///
/// Success returns to the device list. A rejected form or failed write
/// re-renders the form with the submitted input.
///
/// # Errors
///
/// Returns [`DashboardError::DeviceNotFound`] for an unknown device.
pub async fn update_device(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Form(form): Form<DeviceEditForm>,
) -> Result<Response, DashboardError> {
    let Some(device_id) = query.id() else {
        return Ok(Redirect::to("/devices").into_response());
    };

    let failure = match form.to_update(Utc::now()) {
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        Ok(update) => match state.device_service.update_device(device_id, &update).await {
            Ok(()) => {
                let target = href("/devices", &[("notice", NoticeCode::DeviceUpdated.as_str())]);
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e @ DashboardError::DeviceNotFound(_)) => return Err(e),
            Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        },
    };

    let (status, message) = failure;
    let device = state
        .device_service
        .get_device(device_id)
        .await?
        .ok_or_else(|| DashboardError::DeviceNotFound(device_id.to_string()))?;
    let mut page = DeviceEditPage::from_device(&device);
    form.refill(&mut page);
    page.notice = Some(Notice::error(format!("Error updating device: {message}")));
    render_status(status, &page)
}

/// `POST /device/delete`: Delete a device (irreversible) and return to its
/// project dashboard.
///
/// # Errors
///
/// Returns [`DashboardError`] if the failure page cannot be built.
pub async fn delete_device(
    State(state): State<AppState>,
    Form(form): Form<DeleteDeviceForm>,
) -> Result<Response, DashboardError> {
    let device_id = form.device_id.trim();
    let project_id = form.project_id.trim();
    if device_id.is_empty() {
        return Ok(Redirect::to("/devices").into_response());
    }

    match state.device_service.delete_device(device_id).await {
        Ok(()) => {
            let notice = NoticeCode::DeviceDeleted.as_str();
            let target = if project_id.is_empty() {
                href("/devices", &[("notice", notice)])
            } else {
                href("/project", &[("id", project_id), ("notice", notice)])
            };
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            let notice = Notice::error(format!("Error deleting device: {e}"));
            let status = e.status_code();
            if project_id.is_empty() {
                let page = devices_page(&state, Some(notice)).await?;
                return render_status(status, &page);
            }
            dashboards::dashboard_for(&state, project_id, Some(notice), None, status).await
        }
    }
}

/// Device routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{id}/switch", post(toggle_switch))
        .route("/device/edit", get(edit_device).post(update_device))
        .route("/device/delete", post(delete_device))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::{Value, json};

    use super::*;
    use crate::web::handlers::test_support::{app, fleet, get, post_form, send};

    fn in_page_toggle(device_id: &str, current: &str) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(format!("/devices/{device_id}/switch"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(FRAGMENT_HEADER, "1")
            .body(Body::from(format!("current={current}")))
        else {
            panic!("bad request");
        };
        request
    }

    fn device_row<'a>(rows: &'a [Value], device_id: &str) -> &'a Value {
        let Some(row) = rows
            .iter()
            .find(|r| r.get("device_id").and_then(Value::as_str) == Some(device_id))
        else {
            panic!("device {device_id} missing");
        };
        row
    }

    #[tokio::test]
    async fn list_shows_devices_newest_first_with_switch_state() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/devices")).await;
        assert_eq!(reply.status, StatusCode::OK);

        let body = &reply.body;
        let (Some(d4), Some(d1), Some(sl)) = (
            body.find("switch-WP01-D004"),
            body.find("switch-WP01-D001"),
            body.find("switch-SL01-D001"),
        ) else {
            panic!("switch controls missing");
        };
        assert!(sl < d4 && d4 < d1, "updated_at desc with nulls first");
        assert!(body.contains("Tank Farm"));
        assert!(body.contains("cylinder (200cm)"));
    }

    #[tokio::test]
    async fn legacy_row_does_not_hide_other_devices() {
        let backend = fleet().await;
        backend
            .seed(
                "devices",
                vec![json!({
                    "device_id": "LEGACY-1",
                    "project_id": "WP01",
                    "role": "gamma",
                    "manual_switch": 2,
                    "tank_shape": "spherical"
                })],
            )
            .await;

        let reply = send(app(&backend), get("/devices")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!reply.body.contains("Error loading devices"));
        assert!(reply.body.contains(">WP01-D001<"));
        assert!(reply.body.contains(">LEGACY-1<"));

        let reply = send(app(&backend), get("/project?id=WP01")).await;
        assert!(!reply.body.contains("Error loading devices"));
        assert!(reply.body.contains(">WP01-D001<"));
        assert!(reply.body.contains(">LEGACY-1<"));

        let reply = send(app(&backend), get("/device/edit?id=LEGACY-1")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("LEGACY-1"));
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let backend = std::sync::Arc::new(crate::backend::MemoryBackend::fleet());
        let reply = send(app(&backend), get("/devices")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("No devices registered yet"));
    }

    #[tokio::test]
    async fn failed_read_is_shown_inline() {
        let backend = fleet().await;
        backend.set_unavailable("devices", true).await;
        let reply = send(app(&backend), get("/devices")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Error loading devices"));
    }

    #[tokio::test]
    async fn toggle_returns_updated_control() {
        let backend = fleet().await;
        let reply = send(app(&backend), in_page_toggle("WP01-D004", "0")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(r#"id="switch-WP01-D004""#));
        assert!(reply.body.contains(">ON<"));
        assert!(reply.body.contains("btn-success"));
        assert!(reply.body.contains(r#"name="current" value="1""#));

        let calls = backend.invocations().await;
        let Some(call) = calls.last() else {
            panic!("switch function not called");
        };
        assert_eq!(call.body, json!({"manual_switch": 1}));

        let reply = send(app(&backend), in_page_toggle("WP01-D004", "1")).await;
        assert!(reply.body.contains(">OFF<"));
        let calls = backend.invocations().await;
        assert_eq!(calls.last().map(|c| c.body.clone()), Some(json!({"manual_switch": 0})));
    }

    #[tokio::test]
    async fn failed_toggle_leaves_state_untouched() {
        let backend = fleet().await;
        backend.fail_functions(Some(500)).await;
        for _ in 0..2 {
            let reply = send(app(&backend), in_page_toggle("WP01-D004", "0")).await;
            assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
            assert!(reply.body.contains("Failed to toggle switch"));
        }
        let rows = backend.rows("devices").await;
        assert_eq!(device_row(&rows, "WP01-D004")["manual_switch"], json!(0));

        let listing = send(app(&backend), get("/devices")).await;
        let Some(start) = listing.body.find(r#"id="switch-WP01-D004""#) else {
            panic!("control missing");
        };
        let control = listing.body.get(start..).unwrap_or_default();
        let Some(end) = control.find("</form>") else {
            panic!("control not closed");
        };
        assert!(control.get(..end).is_some_and(|c| c.contains(">OFF<")));
    }

    #[tokio::test]
    async fn toggle_without_fragment_header_redirects() {
        let backend = fleet().await;
        let reply = send(app(&backend), post_form("/devices/WP01-D004/switch", "current=0")).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), Some("/devices"));
    }

    #[tokio::test]
    async fn toggle_rejects_bad_state() {
        let backend = fleet().await;
        let reply = send(app(&backend), in_page_toggle("WP01-D004", "7")).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(backend.invocations().await.is_empty());
    }

    #[tokio::test]
    async fn edit_without_id_redirects_to_list() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/device/edit")).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), Some("/devices"));
    }

    #[tokio::test]
    async fn edit_unknown_device_is_not_found() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/device/edit?id=nope")).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert!(reply.body.contains("Device not found"));
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/device/edit?id=WP01-D001")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(r#"name="height_cm" value="200""#));
        assert!(reply.body.contains(r#"name="pump_lower_threshold" value="15""#));
        assert!(reply.body.contains("disabled"));
    }

    #[tokio::test]
    async fn non_numeric_height_persists_null() {
        let backend = fleet().await;
        let body = "role=regular&auto_update=on&tank_shape=cylinder&height_cm=abc&width_cm=100\
                    &length_cm=&max_flow_in=5&max_flow_out=&pump_lower_threshold=20&pump_upper_threshold=90";
        let reply = send(app(&backend), post_form("/device/edit?id=WP01-D001", body)).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), Some("/devices?notice=device_updated"));

        let rows = backend.rows("devices").await;
        let row = device_row(&rows, "WP01-D001");
        assert_eq!(row["height_cm"], Value::Null);
        assert_eq!(row["max_flow_in"], json!(5.0));
        assert_eq!(row["max_flow_out"], json!(0.0));
        assert_eq!(row["pump_upper_threshold"], json!(90.0));
        assert_eq!(row["project_id"], json!("WP01"));
        assert_ne!(row["updated_at"], json!("2024-03-01T08:00:00Z"));
    }

    #[tokio::test]
    async fn failed_update_rerenders_form_with_input() {
        let backend = fleet().await;
        backend.set_unavailable("devices", true).await;
        let body = "role=beta&height_cm=321";
        let reply = send(app(&backend), post_form("/device/edit?id=WP01-D001", body)).await;
        // The re-render needs the device row, which is unavailable too.
        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);

        backend.set_unavailable("devices", false).await;
        let bad_shape = "role=beta&tank_shape=sphere&height_cm=321";
        let reply = send(app(&backend), post_form("/device/edit?id=WP01-D001", bad_shape)).await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply.body.contains("Error updating device"));
        assert!(reply.body.contains(r#"name="height_cm" value="321""#));
        let rows = backend.rows("devices").await;
        assert_eq!(device_row(&rows, "WP01-D001")["height_cm"], json!(200));
    }

    #[tokio::test]
    async fn delete_returns_to_project_dashboard() {
        let backend = fleet().await;
        let reply = send(
            app(&backend),
            post_form("/device/delete", "device_id=WP01-D004&project_id=WP01"),
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), Some("/project?id=WP01&notice=device_deleted"));
        let rows = backend.rows("devices").await;
        assert!(
            rows.iter()
                .all(|r| r.get("device_id").and_then(Value::as_str) != Some("WP01-D004"))
        );
    }
}
