//! Device service: listing, editing, registration, deletion and the manual
//! switch.

use std::sync::Arc;

use serde_json::json;

use super::{decode_first, decode_rows, encode};
use crate::backend::{Backend, Filter, Query};
use crate::domain::{Device, DeviceUpdate, NewDevice, SwitchState};
use crate::error::DashboardError;

const TABLE: &str = "devices";

/// Device operations over a [`Backend`].
#[derive(Debug, Clone)]
pub struct DeviceService {
    backend: Arc<dyn Backend>,
    switch_function: String,
}

impl DeviceService {
    /// Creates a new `DeviceService` invoking `switch_function` for toggles.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, switch_function: impl Into<String>) -> Self {
        Self {
            backend,
            switch_function: switch_function.into(),
        }
    }

    /// All devices with their project's name and type, most recently
    /// updated first.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the read fails.
    pub async fn list_devices(&self) -> Result<Vec<Device>, DashboardError> {
        let query = Query::table(TABLE)
            .embed("projects", "project_id", &["project_name", "project_type"])
            .order_desc("updated_at");
        let selection = self.backend.select(&query).await?;
        Ok(decode_rows(selection.rows))
    }

    /// Devices owned by `project_id`, by identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the read fails.
    pub async fn devices_for_project(&self, project_id: &str) -> Result<Vec<Device>, DashboardError> {
        let query = Query::table(TABLE)
            .eq("project_id", project_id)
            .order_asc("device_id");
        let selection = self.backend.select(&query).await?;
        Ok(decode_rows(selection.rows))
    }

    /// Fetches one device with its project's name and type.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the read fails. A missing
    /// device is `Ok(None)`.
    pub async fn get_device(&self, device_id: &str) -> Result<Option<Device>, DashboardError> {
        let query = Query::table(TABLE)
            .embed("projects", "project_id", &["project_name", "project_type"])
            .eq("device_id", device_id)
            .limit(1);
        let selection = self.backend.select(&query).await?;
        Ok(decode_first(selection.rows)?)
    }

    /// Writes the edit form's patch.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::DeviceNotFound`] if no row matched, or a
    /// [`DashboardError::Backend`] if the write fails.
    pub async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceUpdate,
    ) -> Result<(), DashboardError> {
        let patch = encode(update)?;
        let changed = self
            .backend
            .update(TABLE, &[Filter::eq("device_id", device_id)], &patch)
            .await
            .inspect_err(|e| tracing::warn!(device_id, error = %e, "device update failed"))?;
        if changed == 0 {
            return Err(DashboardError::DeviceNotFound(device_id.to_string()));
        }
        tracing::info!(device_id, "device updated");
        Ok(())
    }

    /// Registers a device under its project.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the insert fails (for
    /// example a duplicate identifier).
    pub async fn add_device(&self, device: &NewDevice) -> Result<Device, DashboardError> {
        let row = encode(device)?;
        let stored = self.backend.insert(TABLE, &row).await.inspect_err(|e| {
            tracing::warn!(device_id = %device.device_id, error = %e, "device insert failed");
        })?;
        let device: Device = serde_json::from_value(stored)
            .map_err(|e| DashboardError::Internal(format!("stored device is malformed: {e}")))?;
        tracing::info!(device_id = %device.device_id, project_id = ?device.project_id, "device added");
        Ok(device)
    }

    /// Deletes a device. Its telemetry goes with it.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::DeviceNotFound`] if no row matched, or a
    /// [`DashboardError::Backend`] if the delete fails.
    pub async fn delete_device(&self, device_id: &str) -> Result<(), DashboardError> {
        let removed = self
            .backend
            .delete(TABLE, &[Filter::eq("device_id", device_id)])
            .await
            .inspect_err(|e| tracing::warn!(device_id, error = %e, "device delete failed"))?;
        if removed == 0 {
            return Err(DashboardError::DeviceNotFound(device_id.to_string()));
        }
        tracing::info!(device_id, "device deleted");
        Ok(())
    }

    /// Asks the remote switch function to flip the device from `current`
    /// and returns the acknowledged state.
    ///
    /// Nothing is written locally; on failure the caller keeps `current`.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the function call fails.
    pub async fn toggle_switch(
        &self,
        device_id: &str,
        current: SwitchState,
    ) -> Result<SwitchState, DashboardError> {
        let next = current.flipped();
        let params = [("device_id".to_string(), device_id.to_string())];
        let body = json!({ "manual_switch": next.as_i64() });
        self.backend
            .invoke(&self.switch_function, &params, &body)
            .await
            .inspect_err(|e| tracing::warn!(device_id, error = %e, "switch toggle failed"))?;
        tracing::info!(device_id, state = next.as_i64(), "switch toggled");
        Ok(next)
    }
}
