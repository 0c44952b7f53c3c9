//! Audit trail read endpoint.

use axum::extract::{Query, State};
use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{AuditLogEntry, AuditQuery};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

/// GET /api/activity-logs - Newest-first audit entries within the caller's
/// scope. SUPER_ADMIN reads across tenants; the limit is capped server-side.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Vec<AuditLogEntry>> {
    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let filter = scope.filter_for(EntityKind::AuditLog)?;

    let entries = state
        .audit
        .query(
            filter,
            query.entity_type,
            query.limit.unwrap_or(DEFAULT_LIMIT),
            state.config.audit.query_max_limit,
        )
        .await?;
    Ok(ApiResponse::success(entries))
}
