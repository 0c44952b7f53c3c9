//! Phase-linked payments, tenant-scoped. Payments are created with their
//! project plan; the API exposes listing and status updates.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use bson::doc;
use futures::TryStreamExt;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{to_set_document, Payment, PaymentQuery, PaymentUpdate};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

/// GET /api/payments - Scoped listing, optionally filtered by project.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Vec<Payment>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;

    let mut extra = doc! {};
    if let Some(project_id) = &query.project_id {
        extra.insert("project_id", project_id.as_str());
    }

    let filter = scope.scoped_filter(EntityKind::Payment, extra)?;
    let payments = state
        .store
        .payments()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;
    Ok(ApiResponse::success(payments))
}

/// PUT /api/payments/:id - Update amount/status/paid date.
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(payment_id): Path<String>,
    Json(update): Json<PaymentUpdate>,
) -> ApiResult<Payment> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    find_scoped(&state, &scope, &payment_id).await?;

    let filter = scope.scoped_id_filter(EntityKind::Payment, &payment_id)?;
    let changes = to_set_document(&update)?;
    state
        .store
        .payments()
        .update_one(filter, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "payment",
        &payment_id,
        "updated",
        &user,
        scope.company_id().map(str::to_string),
        changes,
    );

    let payment = find_scoped(&state, &scope, &payment_id).await?;
    Ok(ApiResponse::success(payment))
}

async fn find_scoped(
    state: &AppState,
    scope: &Scope,
    payment_id: &str,
) -> Result<Payment, ApiError> {
    let filter = scope.scoped_id_filter(EntityKind::Payment, payment_id)?;
    state
        .store
        .payments()
        .find_one(filter, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment not found"))
}
