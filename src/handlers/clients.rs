//! CRM client records, tenant-scoped.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use bson::doc;
use futures::TryStreamExt;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Client, ClientCreate, ClientUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// GET /api/clients - Clients visible to the caller's scope.
pub async fn list_clients(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Vec<Client>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let filter = scope.filter_for(EntityKind::Client)?;

    let clients = state
        .store
        .clients()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients - Create a client in the caller's company.
pub async fn create_client(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ClientCreate>,
) -> ApiResult<Client> {
    let company_id = super::own_company_id(&user)?;
    let client = payload.into_client(company_id.clone(), user.id.clone());

    state.store.clients().insert_one(&client, None).await?;
    state.audit.record(
        "client",
        &client.id,
        "created",
        &user,
        Some(company_id),
        doc! { "name": &client.name },
    );

    Ok(ApiResponse::created(client))
}

/// GET /api/clients/:id - One client, if the scope can see it.
pub async fn get_client(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Client> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let client = find_scoped(&state, &scope, &client_id).await?;
    Ok(ApiResponse::success(client))
}

/// PUT /api/clients/:id - Partial update; protected fields are not settable.
pub async fn update_client(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(client_id): Path<String>,
    Json(update): Json<ClientUpdate>,
) -> ApiResult<Client> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &client_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Client, &client_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .clients()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "client",
        &client_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let client = find_scoped(&state, &scope, &client_id).await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(client_id): Path<String>,
) -> ApiResult<Value> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let client = find_scoped(&state, &scope, &client_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Client, &client_id)?;
    state.store.clients().delete_one(filter, None).await?;

    state.audit.record(
        "client",
        &client_id,
        "deleted",
        &user,
        scope.company_id().map(str::to_string),
        doc! { "name": &client.name },
    );

    Ok(ApiResponse::success(json!({ "deleted": client_id })))
}

/// Single-record lookup through the scope filter. Out-of-scope records are
/// indistinguishable from missing ones.
async fn find_scoped(state: &AppState, scope: &Scope, client_id: &str) -> Result<Client, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Client, client_id)?;
    state
        .store
        .clients()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))
}
