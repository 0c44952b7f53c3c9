//! CRM activities (calls, meetings, follow-ups), tenant-scoped.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use bson::doc;
use futures::TryStreamExt;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Activity, ActivityCreate, ActivityQuery, ActivityUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// Activity joined with display names for its client and assignee.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
}

/// GET /api/activities - Scoped listing with optional date/type/status
/// filters. Date bounds compare against `start_date` lexicographically.
pub async fn list_activities(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Vec<ActivityView>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;

    let mut extra = doc! {};
    if let Some(start) = &query.start_date {
        extra.insert("start_date", doc! { "$gte": start.as_str() });
    }
    if let Some(end) = &query.end_date {
        // Range filters bound the activity's own start date
        let clause = match extra.get_document_mut("start_date") {
            Ok(existing) => {
                existing.insert("$lte", end.as_str());
                None
            }
            Err(_) => Some(doc! { "$lte": end.as_str() }),
        };
        if let Some(clause) = clause {
            extra.insert("start_date", clause);
        }
    }
    if let Some(kind) = &query.kind {
        extra.insert("type", kind.as_str());
    }
    if let Some(status) = &query.status {
        extra.insert("status", status.as_str());
    }

    let filter = scope.scoped_filter(EntityKind::Activity, extra)?;
    let activities: Vec<Activity> = state
        .store
        .activities()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;

    let mut views = Vec::with_capacity(activities.len());
    for activity in activities {
        views.push(into_view(&state, activity).await?);
    }
    Ok(ApiResponse::success(views))
}

/// POST /api/activities
pub async fn create_activity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ActivityCreate>,
) -> ApiResult<Activity> {
    let company_id = super::own_company_id(&user)?;
    let activity = payload.into_activity(company_id.clone(), user.id.clone());

    state.store.activities().insert_one(&activity, None).await?;
    state.audit.record(
        "activity",
        &activity.id,
        "created",
        &user,
        Some(company_id),
        doc! { "title": &activity.title, "type": &activity.kind },
    );

    Ok(ApiResponse::created(activity))
}

/// GET /api/activities/:id
pub async fn get_activity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(activity_id): Path<String>,
) -> ApiResult<ActivityView> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let activity = find_scoped(&state, &scope, &activity_id).await?;
    Ok(ApiResponse::success(into_view(&state, activity).await?))
}

/// PUT /api/activities/:id
pub async fn update_activity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(activity_id): Path<String>,
    Json(update): Json<ActivityUpdate>,
) -> ApiResult<Activity> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &activity_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Activity, &activity_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .activities()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "activity",
        &activity_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let activity = find_scoped(&state, &scope, &activity_id).await?;
    Ok(ApiResponse::success(activity))
}

/// DELETE /api/activities/:id
pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(activity_id): Path<String>,
) -> ApiResult<Value> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let activity = find_scoped(&state, &scope, &activity_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Activity, &activity_id)?;
    state.store.activities().delete_one(filter, None).await?;

    state.audit.record(
        "activity",
        &activity_id,
        "deleted",
        &user,
        scope.company_id().map(str::to_string),
        doc! { "title": &activity.title },
    );

    Ok(ApiResponse::success(json!({ "deleted": activity_id })))
}

async fn find_scoped(
    state: &AppState,
    scope: &Scope,
    activity_id: &str,
) -> Result<Activity, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Activity, activity_id)?;
    state
        .store
        .activities()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Activity not found"))
}

async fn into_view(state: &AppState, activity: Activity) -> Result<ActivityView, ApiError> {
    let client_name = match &activity.client_id {
        Some(client_id) => state
            .store
            .clients()
            .find_one(doc! { "id": client_id.as_str() }, None)
            .await?
            .map(|c| c.name),
        None => None,
    };
    let assigned_to_name = match &activity.assigned_to {
        Some(user_id) => state
            .store
            .users()
            .find_one(doc! { "id": user_id.as_str() }, None)
            .await?
            .map(|u| u.name),
        None => None,
    };
    Ok(ActivityView {
        activity,
        client_name,
        assigned_to_name,
    })
}
