//! Project phases with client approval flow, tenant-scoped.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Comment, CommentCreate, Phase, PhaseQuery, PhaseUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// GET /api/phases - Scoped listing, optionally filtered by project.
pub async fn list_phases(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<PhaseQuery>,
) -> ApiResult<Vec<Phase>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;

    let mut extra = doc! {};
    if let Some(project_id) = &query.project_id {
        extra.insert("project_id", project_id.as_str());
    }

    let filter = scope.scoped_filter(EntityKind::Phase, extra)?;
    let phases = state
        .store
        .phases()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;
    Ok(ApiResponse::success(phases))
}

/// GET /api/phases/:id
pub async fn get_phase(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(phase_id): Path<String>,
) -> ApiResult<Phase> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let phase = find_scoped(&state, &scope, &phase_id).await?;
    Ok(ApiResponse::success(phase))
}

/// PUT /api/phases/:id
pub async fn update_phase(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(phase_id): Path<String>,
    Json(update): Json<PhaseUpdate>,
) -> ApiResult<Phase> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &phase_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Phase, &phase_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .phases()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "phase",
        &phase_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let phase = find_scoped(&state, &scope, &phase_id).await?;
    Ok(ApiResponse::success(phase))
}

/// POST /api/phases/:id/approve - Mark the phase approved by the caller.
pub async fn approve_phase(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(phase_id): Path<String>,
) -> ApiResult<Phase> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &phase_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Phase, &phase_id)?;
    let changes = doc! {
        "status": "aprobada",
        "approved_by": user.id.as_str(),
        "approved_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339(),
    };
    state
        .store
        .phases()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "phase",
        &phase_id,
        "approved",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let phase = find_scoped(&state, &scope, &phase_id).await?;
    Ok(ApiResponse::success(phase))
}

/// POST /api/phases/:id/comments - Append a comment sub-document.
pub async fn add_phase_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(phase_id): Path<String>,
    Json(payload): Json<CommentCreate>,
) -> ApiResult<Comment> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &phase_id).await?;

    let comment = Comment::new(payload.text, user.id.clone(), user.name.clone());
    let filter = scope.scoped_id_filter(EntityKind::Phase, &phase_id)?;
    state
        .store
        .phases()
        .update_one(
            filter,
            doc! { "$push": { "comments": bson::to_bson(&comment)? } },
            None,
        )
        .await?;

    state.audit.record(
        "phase",
        &phase_id,
        "commented",
        &user,
        scope.company_id().map(str::to_string),
        doc! { "comment_id": &comment.id },
    );

    Ok(ApiResponse::created(comment))
}

async fn find_scoped(state: &AppState, scope: &Scope, phase_id: &str) -> Result<Phase, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Phase, phase_id)?;
    state
        .store
        .phases()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Phase not found"))
}
