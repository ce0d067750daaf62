//! Project handlers: card grid, create/edit forms with the custom-field
//! editor, and delete.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::app_state::AppState;
use crate::error::DashboardError;
use crate::format::{Notice, NoticeCode, notice_from_query};
use crate::web::field_editor::{CREATE_PREFIX, EDIT_PREFIX, FieldEditor};
use crate::web::forms::{IdQuery, Intent, NoticeQuery, ProjectForm};
use crate::web::views::{
    ListState, ProjectCard, ProjectFormPage, ProjectsPage, SelectOption, render_fragments,
};
use crate::web::{href, render, render_status};

async fn projects_page(state: &AppState, notice: Option<Notice>) -> ProjectsPage {
    let projects = ListState::from_result(
        state
            .project_service
            .list_projects()
            .await
            .map(|summaries| summaries.iter().map(ProjectCard::from).collect()),
        "Error loading projects",
    );
    ProjectsPage {
        nav: "projects",
        notice,
        projects,
    }
}

/// Create or edit form for `form`.
fn form_page(
    form: &ProjectForm,
    action: String,
    creating: bool,
    notice: Option<Notice>,
) -> Result<ProjectFormPage, DashboardError> {
    let (heading, submit_label) = if creating {
        ("Create New Project", "Create Project")
    } else {
        ("Edit Project", "Save Changes")
    };
    Ok(ProjectFormPage {
        nav: "projects",
        notice,
        heading,
        action,
        creating,
        project_id: form.project_id.clone(),
        project_name: form.project_name.clone(),
        types: SelectOption::project_types(form.selected_type().as_ref()),
        ml_enabled: form.ml_enabled,
        fields: render_fragments(form.editor.fragments())?,
        submit_label,
    })
}

/// Applies an editor intent in place. Returns `false` for [`Intent::Save`].
fn apply_editor_intent(form: &mut ProjectForm) -> bool {
    match &form.intent {
        Intent::Save => false,
        Intent::AddField => {
            form.editor.add();
            true
        }
        Intent::RemoveField(key) => {
            form.editor.remove(key);
            true
        }
    }
}

/// `GET /projects`: Project cards, most recently created first.
///
/// # Errors
///
/// Returns [`DashboardError`] only if the page fails to render.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    let page = projects_page(&state, notice_from_query(query.notice.as_deref())).await;
    render(&page)
}

/// `GET /projects/new`: Empty create form.
///
/// # Errors
///
/// Returns [`DashboardError`] if the page fails to render.
pub async fn new_project() -> Result<impl IntoResponse, DashboardError> {
    let form = ProjectForm {
        project_id: String::new(),
        project_name: String::new(),
        project_type: String::new(),
        ml_enabled: false,
        intent: Intent::Save,
        editor: FieldEditor::new(CREATE_PREFIX),
    };
    render(&form_page(&form, "/projects/new".to_string(), true, None)?)
}

/// `POST /projects/new`: Edit the field list, or validate and insert.
///
/// # Errors
///
/// Returns [`DashboardError`] if the page fails to render.
pub async fn create_project(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError> {
    let mut form = ProjectForm::from_pairs(CREATE_PREFIX, &pairs);
    let action = "/projects/new".to_string();
    if apply_editor_intent(&mut form) {
        return render_status(StatusCode::OK, &form_page(&form, action, true, None)?);
    }

    let (status, message) = match form.to_new_project() {
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        Ok(project) => match state.project_service.create_project(&project).await {
            Ok(()) => {
                let target = href("/projects", &[("notice", NoticeCode::ProjectCreated.as_str())]);
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => (e.status_code(), e.to_string()),
        },
    };
    let notice = Notice::error(format!("Error creating project: {message}"));
    render_status(status, &form_page(&form, action, true, Some(notice))?)
}

/// `GET /project/edit?id=`: Edit form with the editor rebuilt from the
/// stored descriptors.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] for an unknown project.
pub async fn edit_project(
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
    let form = ProjectForm::from_project(EDIT_PREFIX, &project);
    let action = href("/project/edit", &[("id", project_id)]);
    Ok(render(&form_page(&form, action, false, None)?)?.into_response())
}

/// `POST /project/edit?id=`: Edit the field list, or validate and update.
///
/// # Errors
///
/// Returns [`DashboardError::ProjectNotFound`] if the project disappeared.
pub async fn update_project(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError> {
    let Some(project_id) = query.id() else {
        return Ok(Redirect::to("/projects").into_response());
    };
    let mut form = ProjectForm::from_pairs(EDIT_PREFIX, &pairs);
    project_id.clone_into(&mut form.project_id);
    let action = href("/project/edit", &[("id", project_id)]);
    if apply_editor_intent(&mut form) {
        return render_status(StatusCode::OK, &form_page(&form, action, false, None)?);
    }

    let (status, message) = match form.to_changes() {
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        Ok(changes) => match state.project_service.update_project(project_id, &changes).await {
            Ok(()) => {
                let target = href("/projects", &[("notice", NoticeCode::ProjectUpdated.as_str())]);
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e @ DashboardError::ProjectNotFound(_)) => return Err(e),
            Err(e) => (e.status_code(), e.to_string()),
        },
    };
    let notice = Notice::error(format!("Error updating project: {message}"));
    render_status(status, &form_page(&form, action, false, Some(notice))?)
}

/// `POST /project/delete?id=`: Delete a project; the backend cascades to
/// its devices and telemetry.
///
/// # Errors
///
/// Returns [`DashboardError`] if the failure page cannot be rendered.
pub async fn delete_project(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, DashboardError> {
    let Some(project_id) = query.id() else {
        return Ok(Redirect::to("/projects").into_response());
    };
    match state.project_service.delete_project(project_id).await {
        Ok(()) => {
            let target = href("/projects", &[("notice", NoticeCode::ProjectDeleted.as_str())]);
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            let notice = Notice::error(format!("Error deleting project: {e}"));
            let page = projects_page(&state, Some(notice)).await;
            render_status(e.status_code(), &page)
        }
    }
}

/// Project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/new", get(new_project).post(create_project))
        .route("/project/edit", get(edit_project).post(update_project))
        .route("/project/delete", post(delete_project))
}
