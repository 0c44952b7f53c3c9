//! Projects, tenant-scoped. Projects are provisioned with their plan; the
//! API exposes listing and partial updates (status, assignment, client link).

use axum::extract::{Path, State};
use axum::{Extension, Json};
use bson::doc;
use futures::TryStreamExt;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Project, ProjectUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Vec<Project>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let filter = scope.filter_for(EntityKind::Project)?;

    let projects = state
        .store
        .projects()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Project> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let project = find_scoped(&state, &scope, &project_id).await?;
    Ok(ApiResponse::success(project))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(project_id): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Project> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &project_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Project, &project_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .projects()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "project",
        &project_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let project = find_scoped(&state, &scope, &project_id).await?;
    Ok(ApiResponse::success(project))
}

async fn find_scoped(
    state: &AppState,
    scope: &Scope,
    project_id: &str,
) -> Result<Project, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Project, project_id)?;
    state
        .store
        .projects()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}
