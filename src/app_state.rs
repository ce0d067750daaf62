//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::backend::Backend;
use crate::service::{DeviceService, ProjectService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Device reads, edits and the manual switch.
    pub device_service: Arc<DeviceService>,
    /// Projects, device counts and telemetry.
    pub project_service: Arc<ProjectService>,
}

impl AppState {
    /// Wires both services to the same backend.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, switch_function: &str, telemetry_limit: u32) -> Self {
        Self {
            device_service: Arc::new(DeviceService::new(Arc::clone(&backend), switch_function)),
            project_service: Arc::new(ProjectService::new(backend, telemetry_limit)),
        }
    }
}
