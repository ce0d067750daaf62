//! System endpoints: health check, root redirect, embedded assets and the
//! not-found page.

use askama::Template;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::ErrorPage;

const SCRIPT: &str = include_str!("../../../assets/dashboard.js");
const STYLESHEET: &str = include_str!("../../../assets/dashboard.css");

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /`: Projects are the landing page.
pub async fn root_handler() -> Redirect {
    Redirect::to("/projects")
}

/// `GET /static/dashboard.js`
pub async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SCRIPT,
    )
}

/// `GET /static/dashboard.css`
pub async fn stylesheet_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

/// Fallback for unknown paths.
pub async fn not_found() -> Response {
    let page = ErrorPage {
        nav: "",
        notice: None,
        status: StatusCode::NOT_FOUND.as_u16(),
        code: 2000,
        title: "Page not found".to_string(),
        message: "There is nothing at this address.".to_string(),
    };
    match page.render() {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/static/dashboard.js", get(script_handler))
        .route("/static/dashboard.css", get(stylesheet_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::handlers::test_support::{app, fleet, get, send};

    #[tokio::test]
    async fn health_reports_version() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/health")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("\"status\":\"healthy\""));
        assert!(reply.body.contains(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn root_redirects_to_projects() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/")).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), Some("/projects"));
    }

    #[tokio::test]
    async fn unknown_path_renders_not_found_page() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/firmware")).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert!(reply.body.contains("Page not found"));
    }

    #[tokio::test]
    async fn script_is_served() {
        let backend = fleet().await;
        let reply = send(app(&backend), get("/static/dashboard.js")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("x-dashboard-fragment"));
    }
}
