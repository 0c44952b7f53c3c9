//! Weekly task board, tenant-scoped. Tasks belong to a project and carry
//! embedded comments.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use bson::doc;
use futures::TryStreamExt;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Comment, CommentCreate, Task, TaskCreate, TaskQuery, TaskUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// GET /api/tasks - Scoped listing with optional project/week filters.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Vec<Task>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;

    let mut extra = doc! {};
    if let Some(project_id) = &query.project_id {
        extra.insert("project_id", project_id.as_str());
    }
    if let Some(week) = query.week {
        extra.insert("week", week);
    }

    let filter = scope.scoped_filter(EntityKind::Task, extra)?;
    let tasks = state
        .store
        .tasks()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks - Create a task under a project the caller can see.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(payload): Json<TaskCreate>,
) -> ApiResult<Task> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let company_id = super::own_company_id(&user)?;

    // The parent project must be inside the caller's scope
    let project_filter = scope.scoped_id_filter(EntityKind::Project, &payload.project_id)?;
    state
        .store
        .projects()
        .find_one(project_filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let task = payload.into_task(company_id.clone(), user.id.clone());
    state.store.tasks().insert_one(&task, None).await?;

    state.audit.record(
        "task",
        &task.id,
        "created",
        &user,
        Some(company_id),
        doc! { "title": &task.title, "project_id": &task.project_id },
    );

    Ok(ApiResponse::created(task))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(task_id): Path<String>,
) -> ApiResult<Task> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let task = find_scoped(&state, &scope, &task_id).await?;
    Ok(ApiResponse::success(task))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(task_id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Task> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &task_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Task, &task_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .tasks()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "task",
        &task_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let task = find_scoped(&state, &scope, &task_id).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(task_id): Path<String>,
) -> ApiResult<Value> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let task = find_scoped(&state, &scope, &task_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Task, &task_id)?;
    state.store.tasks().delete_one(filter, None).await?;

    state.audit.record(
        "task",
        &task_id,
        "deleted",
        &user,
        scope.company_id().map(str::to_string),
        doc! { "title": &task.title },
    );

    Ok(ApiResponse::success(json!({ "deleted": task_id })))
}

/// POST /api/tasks/:id/comments - Append a comment sub-document.
pub async fn add_task_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(task_id): Path<String>,
    Json(payload): Json<CommentCreate>,
) -> ApiResult<Comment> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &task_id).await?;

    let comment = Comment::new(payload.text, user.id.clone(), user.name.clone());
    let filter = scope.scoped_id_filter(EntityKind::Task, &task_id)?;
    state
        .store
        .tasks()
        .update_one(
            filter,
            doc! { "$push": { "comments": bson::to_bson(&comment)? } },
            None,
        )
        .await?;

    state.audit.record(
        "task",
        &task_id,
        "commented",
        &user,
        scope.company_id().map(str::to_string),
        doc! { "comment_id": &comment.id },
    );

    Ok(ApiResponse::created(comment))
}

async fn find_scoped(state: &AppState, scope: &Scope, task_id: &str) -> Result<Task, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Task, task_id)?;
    state
        .store
        .tasks()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}
