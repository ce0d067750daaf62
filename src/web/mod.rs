//! Web layer: HTML page handlers, templates, form DTOs and router
//! composition.

pub mod field_editor;
pub mod forms;
pub mod handlers;
pub mod views;

use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use reqwest::Url;

use crate::app_state::AppState;
use crate::error::DashboardError;

/// Request header marking an in-page switch toggle that wants the control
/// fragment back instead of a redirect.
pub const FRAGMENT_HEADER: &str = "x-dashboard-fragment";

/// Builds the complete router with every page, form target and asset.
pub fn build_router() -> Router<AppState> {
    handlers::routes().fallback(handlers::system::not_found)
}

/// Renders a template into an HTML response body.
///
/// # Errors
///
/// Returns [`DashboardError::Template`] if rendering fails.
pub(crate) fn render<T: Template>(page: &T) -> Result<Html<String>, DashboardError> {
    Ok(Html(page.render()?))
}

/// Renders a template with an explicit status.
///
/// # Errors
///
/// Returns [`DashboardError::Template`] if rendering fails.
pub(crate) fn render_status<T: Template>(
    status: StatusCode,
    page: &T,
) -> Result<Response, DashboardError> {
    Ok((status, render(page)?).into_response())
}

/// Site-relative link with an encoded query string.
#[must_use]
pub fn href(path: &str, params: &[(&str, &str)]) -> String {
    let Ok(mut url) = Url::parse("http://dashboard.invalid/") else {
        return path.to_string();
    };
    url.set_path(path);
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_encodes_query_values() {
        assert_eq!(href("/project", &[("id", "WP01")]), "/project?id=WP01");
        assert_eq!(
            href("/project", &[("id", "A B&C"), ("notice", "device_added")]),
            "/project?id=A+B%26C&notice=device_added"
        );
        assert_eq!(href("/devices", &[]), "/devices");
    }
}
