//! Dashboard error types with HTTP status code mapping.
//!
//! [`DashboardError`] is the central error type for handlers and services.
//! Each variant maps to a specific HTTP status code and numeric error code,
//! and renders as an HTML error page.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::backend::BackendError;
use crate::format::Notice;

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server/Backend  | 500 / 502                  |
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// No device with the given identifier.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// No project with the given identifier.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Submitted input failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The hosted backend failed or rejected the call.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::DeviceNotFound(_) => 2001,
            Self::ProjectNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Backend(_) => 3001,
            Self::Template(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DeviceNotFound(_) | Self::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Template(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Page heading for this error.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::DeviceNotFound(_) => "Device not found",
            Self::ProjectNotFound(_) => "Project not found",
            Self::InvalidRequest(_) => "Invalid request",
            Self::Backend(_) => "Backend unavailable",
            Self::Template(_) | Self::Internal(_) => "Something went wrong",
        }
    }

    /// Navigation entry highlighted on the error page.
    const fn nav(&self) -> &'static str {
        match self {
            Self::DeviceNotFound(_) => "devices",
            _ => "projects",
        }
    }
}

/// HTML body of an error response.
#[derive(Debug, Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    /// Highlighted navigation entry.
    pub nav: &'static str,
    /// Toast (never set on error pages).
    pub notice: Option<Notice>,
    /// HTTP status.
    pub status: u16,
    /// Numeric error code.
    pub code: u32,
    /// Heading.
    pub title: String,
    /// Detail line.
    pub message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "request failed");
        }
        let page = ErrorPage {
            nav: self.nav(),
            notice: None,
            status: status.as_u16(),
            code: self.error_code(),
            title: self.title().to_string(),
            message: self.to_string(),
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, self.to_string()).into_response(),
        }
    }
}
