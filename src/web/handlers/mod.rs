//! Page handlers organized by resource.

pub mod dashboards;
pub mod devices;
pub mod projects;
pub mod system;
pub mod telemetry;

use axum::Router;

use crate::app_state::AppState;

/// Composes every resource's routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(system::routes())
        .merge(devices::routes())
        .merge(projects::routes())
        .merge(dashboards::routes())
        .merge(telemetry::routes())
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::app_state::AppState;
    use crate::backend::{Backend, MemoryBackend};
    use crate::web::build_router;

    /// Backend with two projects, four devices and a few samples.
    pub(crate) async fn fleet() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::fleet());
        backend
            .seed(
                "projects",
                vec![
                    json!({"project_id": "WP01", "project_name": "Tank Farm", "project_type": "water_pump", "ml_enabled": true, "custom_fields": [], "created_at": "2024-01-01T00:00:00Z"}),
                    json!({"project_id": "SL01", "project_name": "Street Lights", "project_type": "smart_light", "ml_enabled": false, "custom_fields": null, "created_at": "2024-01-02T00:00:00Z"}),
                ],
            )
            .await;
        backend
            .seed(
                "devices",
                vec![
                    json!({"device_id": "WP01-D001", "project_id": "WP01", "role": "regular", "auto_update": true, "manual_switch": 1, "tank_shape": "cylinder", "height_cm": 200, "width_cm": 100, "updated_at": "2024-03-01T08:00:00Z"}),
                    json!({"device_id": "WP01-D004", "project_id": "WP01", "role": "beta", "auto_update": false, "manual_switch": 0, "updated_at": "2024-03-02T08:00:00Z"}),
                    json!({"device_id": "SL01-D001", "project_id": "SL01", "role": "regular", "auto_update": false, "manual_switch": 0, "updated_at": null}),
                ],
            )
            .await;
        backend
            .seed(
                "wp_samples",
                vec![
                    json!({"project_id": "WP01", "device_id": "WP01-D001", "ts_utc": "2024-03-01T10:00:00Z", "water_level": 41.5}),
                    json!({"project_id": "WP01", "device_id": "WP01-D004", "ts_utc": "2024-03-01T11:00:00Z", "water_level": 63}),
                ],
            )
            .await;
        backend
    }

    /// Full router over `backend`.
    pub(crate) fn app(backend: &Arc<MemoryBackend>) -> Router {
        let backend: Arc<dyn Backend> = Arc::clone(backend) as Arc<dyn Backend>;
        build_router().with_state(AppState::new(backend, "esp32-switch", 20))
    }

    /// Response status, headers and body text.
    pub(crate) struct Reply {
        pub(crate) status: StatusCode,
        pub(crate) headers: HeaderMap,
        pub(crate) body: String,
    }

    impl Reply {
        /// `Location` header of a redirect.
        pub(crate) fn location(&self) -> Option<&str> {
            self.headers
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
        }
    }

    pub(crate) async fn send(app: Router, request: Request<Body>) -> Reply {
        let response = match app.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let headers = response.headers().clone();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body could not be read");
        };
        Reply {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("bad request: {uri}");
        };
        request
    }

    pub(crate) fn post_form(uri: &str, body: &str) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
        else {
            panic!("bad request: {uri}");
        };
        request
    }
}
