//! Dashboard stats. SUPER_ADMIN sees platform numbers; everyone else sees
//! their company's counts through their scope filters.

use axum::extract::State;
use axum::Extension;
use bson::doc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::scope::{EntityKind, Scope};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CompanyStats {
    pub clients: u64,
    pub activities: u64,
    pub pending_activities: u64,
    pub projects: u64,
    pub tasks: u64,
}

/// GET /api/dashboard/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Value> {
    if user.role.is_super_admin() {
        let companies = state.store.companies().count_documents(doc! {}, None).await?;
        let users = state.store.users().count_documents(doc! {}, None).await?;
        return Ok(ApiResponse::success(json!({
            "scope": "platform",
            "companies": companies,
            "users": users,
        })));
    }

    let scope = Scope::resolve(&state.store, &user, tenant.as_ref()).await?;
    let store = &state.store;

    let clients = store
        .clients()
        .count_documents(scope.filter_for(EntityKind::Client)?, None)
        .await?;
    let activities = store
        .activities()
        .count_documents(scope.filter_for(EntityKind::Activity)?, None)
        .await?;
    let pending_activities = store
        .activities()
        .count_documents(
            scope.scoped_filter(EntityKind::Activity, doc! { "completed": false })?,
            None,
        )
        .await?;
    let projects = store
        .projects()
        .count_documents(scope.filter_for(EntityKind::Project)?, None)
        .await?;
    let tasks = store
        .tasks()
        .count_documents(scope.filter_for(EntityKind::Task)?, None)
        .await?;

    let stats = CompanyStats {
        clients,
        activities,
        pending_activities,
        projects,
        tasks,
    };
    Ok(ApiResponse::success(json!({
        "scope": "company",
        "stats": stats,
    })))
}
