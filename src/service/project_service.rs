//! Project service: CRUD over projects plus read-only telemetry.

use std::sync::Arc;

use futures_util::future::{join_all, try_join};

use super::{decode_first, decode_rows, encode};
use crate::backend::{Backend, BackendError, Filter, Query};
use crate::domain::telemetry::TIMESTAMP_COLUMN;
use crate::domain::{
    NewProject, Project, ProjectChanges, ProjectSummary, ProjectType, TelemetryOverview,
    TelemetrySample,
};
use crate::error::DashboardError;

const TABLE: &str = "projects";
const DEVICES: &str = "devices";
const MODELS: &str = "ml_models";

/// Project operations over a [`Backend`].
#[derive(Debug, Clone)]
pub struct ProjectService {
    backend: Arc<dyn Backend>,
    telemetry_limit: u32,
}

impl ProjectService {
    /// Creates a new `ProjectService` fetching at most `telemetry_limit`
    /// recent samples per read.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, telemetry_limit: u32) -> Self {
        Self {
            backend,
            telemetry_limit,
        }
    }

    /// Number of recent samples fetched per telemetry read.
    #[must_use]
    pub const fn telemetry_limit(&self) -> u32 {
        self.telemetry_limit
    }

    /// All projects, newest first, each with its device count.
    ///
    /// Counts are fetched concurrently, one head query per project. A failed
    /// count leaves that project's count unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the listing fails.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, DashboardError> {
        let query = Query::table(TABLE).order_desc("created_at");
        let selection = self.backend.select(&query).await?;
        let projects: Vec<Project> = decode_rows(selection.rows);

        let counts = join_all(projects.iter().map(|project| async move {
            self.device_count(&project.project_id)
                .await
                .inspect_err(|e| {
                    tracing::warn!(project_id = %project.project_id, error = %e, "device count failed");
                })
                .ok()
        }))
        .await;

        Ok(projects
            .into_iter()
            .zip(counts)
            .map(|(project, device_count)| ProjectSummary {
                project,
                device_count,
            })
            .collect())
    }

    async fn device_count(&self, project_id: &str) -> Result<u64, BackendError> {
        let query = Query::table(DEVICES).eq("project_id", project_id).head();
        let selection = self.backend.select(&query).await?;
        Ok(selection.total.unwrap_or_default())
    }

    /// Fetches one project.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the read fails. A missing
    /// project is `Ok(None)`.
    pub async fn get_project(&self, project_id: &str) -> Result<Option<Project>, DashboardError> {
        let query = Query::table(TABLE).eq("project_id", project_id).limit(1);
        let selection = self.backend.select(&query).await?;
        Ok(decode_first(selection.rows)?)
    }

    /// Inserts a project with its custom-field schema.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the insert fails (for
    /// example a duplicate identifier).
    pub async fn create_project(&self, project: &NewProject) -> Result<(), DashboardError> {
        let row = encode(project)?;
        self.backend.insert(TABLE, &row).await.inspect_err(|e| {
            tracing::warn!(project_id = %project.project_id, error = %e, "project insert failed");
        })?;
        tracing::info!(
            project_id = %project.project_id,
            project_type = %project.changes.project_type,
            fields = project.changes.custom_fields.len(),
            "project created"
        );
        Ok(())
    }

    /// Replaces a project's name, type, ML flag and custom fields.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::ProjectNotFound`] if no row matched, or a
    /// [`DashboardError::Backend`] if the write fails.
    pub async fn update_project(
        &self,
        project_id: &str,
        changes: &ProjectChanges,
    ) -> Result<(), DashboardError> {
        let patch = encode(changes)?;
        let changed = self
            .backend
            .update(TABLE, &[Filter::eq("project_id", project_id)], &patch)
            .await
            .inspect_err(|e| tracing::warn!(project_id, error = %e, "project update failed"))?;
        if changed == 0 {
            return Err(DashboardError::ProjectNotFound(project_id.to_string()));
        }
        tracing::info!(project_id, fields = changes.custom_fields.len(), "project updated");
        Ok(())
    }

    /// Deletes a project. The store cascades to its devices and telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::ProjectNotFound`] if no row matched, or a
    /// [`DashboardError::Backend`] if the delete fails.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), DashboardError> {
        let removed = self
            .backend
            .delete(TABLE, &[Filter::eq("project_id", project_id)])
            .await
            .inspect_err(|e| tracing::warn!(project_id, error = %e, "project delete failed"))?;
        if removed == 0 {
            return Err(DashboardError::ProjectNotFound(project_id.to_string()));
        }
        tracing::info!(project_id, "project deleted");
        Ok(())
    }

    /// Sample total, recent samples and model count for a project, or
    /// `None` when its type records no telemetry.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if either read fails.
    pub async fn telemetry_overview(
        &self,
        project: &Project,
    ) -> Result<Option<TelemetryOverview>, DashboardError> {
        let Some(table) = project.project_type.telemetry_table() else {
            return Ok(None);
        };
        let samples = Query::table(table)
            .eq("project_id", project.project_id.as_str())
            .order_desc(TIMESTAMP_COLUMN)
            .limit(self.telemetry_limit)
            .with_count();
        let models = Query::table(MODELS)
            .eq("project_id", project.project_id.as_str())
            .order_desc("created_at")
            .head();

        let (samples, models) =
            try_join(self.backend.select(&samples), self.backend.select(&models)).await?;
        let recent: Vec<TelemetrySample> = decode_rows(samples.rows);

        Ok(Some(TelemetryOverview {
            total_samples: samples.total.unwrap_or(recent.len() as u64),
            recent,
            model_count: models.total.unwrap_or_default(),
        }))
    }

    /// Most recent samples recorded under `column = value` in the telemetry
    /// table of `project_type`, or `None` when that type records none.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError::Backend`] if the read fails.
    pub async fn recent_samples(
        &self,
        project_type: &ProjectType,
        column: &str,
        value: &str,
    ) -> Result<Option<Vec<TelemetrySample>>, DashboardError> {
        let Some(table) = project_type.telemetry_table() else {
            return Ok(None);
        };
        let query = Query::table(table)
            .eq(column, value)
            .order_desc(TIMESTAMP_COLUMN)
            .limit(self.telemetry_limit);
        let selection = self.backend.select(&query).await?;
        Ok(Some(decode_rows(selection.rows)))
    }
}
