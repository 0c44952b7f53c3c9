//! SUPER_ADMIN surface: cross-tenant company administration and platform
//! metrics. Every handler re-checks the role; routing alone is not trusted.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use bson::doc;
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};

use crate::auth::guards::require_super_admin;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::{
    to_set_document, Company, CompanyUpdate, SubscriptionStatus, SubscriptionUpdate, UserPublic,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CompanySummary {
    #[serde(flatten)]
    pub company: Company,
    pub user_count: u64,
    pub client_count: u64,
}

#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub users: Vec<UserPublic>,
    pub client_count: u64,
    pub activity_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ModuleAssignment {
    pub modules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlatformMetrics {
    pub total_companies: u64,
    pub active_companies: u64,
    pub trial_companies: u64,
    pub total_users: u64,
    pub recent_companies: Vec<Company>,
}

/// GET /api/admin/companies - All tenants with headline counts.
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<CompanySummary>> {
    require_super_admin(&user)?;

    let companies: Vec<Company> = state
        .store
        .companies()
        .find(doc! {}, None)
        .await?
        .try_collect()
        .await?;

    let mut summaries = Vec::with_capacity(companies.len());
    for company in companies {
        let tenant_filter = doc! { "company_id": company.id.as_str() };
        let user_count = state.store.users().count_documents(tenant_filter.clone(), None).await?;
        let client_count = state.store.clients().count_documents(tenant_filter, None).await?;
        summaries.push(CompanySummary {
            company,
            user_count,
            client_count,
        });
    }

    Ok(ApiResponse::success(summaries))
}

/// GET /api/admin/companies/:id - One tenant with its user roster.
pub async fn get_company(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(company_id): Path<String>,
) -> ApiResult<CompanyDetail> {
    require_super_admin(&user)?;

    let company = find_company(&state, &company_id).await?;
    let tenant_filter = doc! { "company_id": company_id.as_str() };

    let users: Vec<UserPublic> = state
        .store
        .users()
        .find(tenant_filter.clone(), None)
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .iter()
        .map(|u| UserPublic::from_user(u, Some(company.name.clone())))
        .collect();

    let client_count = state.store.clients().count_documents(tenant_filter.clone(), None).await?;
    let activity_count = state.store.activities().count_documents(tenant_filter, None).await?;

    Ok(ApiResponse::success(CompanyDetail {
        company,
        users,
        client_count,
        activity_count,
    }))
}

/// PUT /api/admin/companies/:id - Partial update of tenant profile/status.
pub async fn update_company(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(company_id): Path<String>,
    Json(update): Json<CompanyUpdate>,
) -> ApiResult<Company> {
    require_super_admin(&user)?;
    find_company(&state, &company_id).await?;

    let changes = to_set_document(&update)?;
    state
        .store
        .companies()
        .update_one(doc! { "id": company_id.as_str() }, doc! { "$set": changes.clone() }, None)
        .await?;

    state
        .audit
        .record("company", &company_id, "updated", &user, Some(company_id.clone()), changes);

    let company = find_company(&state, &company_id).await?;
    Ok(ApiResponse::success(company))
}

/// POST /api/admin/companies/:id/modules - Replace the licensed module set.
pub async fn assign_modules(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(company_id): Path<String>,
    Json(assignment): Json<ModuleAssignment>,
) -> ApiResult<Company> {
    require_super_admin(&user)?;
    find_company(&state, &company_id).await?;

    let catalog = super::public::module_catalog();
    let known: Vec<&str> = catalog
        .as_array()
        .map(|mods| mods.iter().filter_map(|m| m["id"].as_str()).collect())
        .unwrap_or_default();
    for module in &assignment.modules {
        if !known.contains(&module.as_str()) {
            return Err(ApiError::bad_request(format!("Unknown module: {module}")));
        }
    }

    let changes = doc! {
        "active_modules": assignment.modules.clone(),
        "updated_at": Utc::now().to_rfc3339(),
    };
    state
        .store
        .companies()
        .update_one(doc! { "id": company_id.as_str() }, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "company",
        &company_id,
        "modules_assigned",
        &user,
        Some(company_id.clone()),
        changes,
    );

    let company = find_company(&state, &company_id).await?;
    Ok(ApiResponse::success(company))
}

/// POST /api/admin/companies/:id/subscription - Change subscription state,
/// optionally extending a running trial.
pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(company_id): Path<String>,
    Json(update): Json<SubscriptionUpdate>,
) -> ApiResult<Company> {
    require_super_admin(&user)?;
    let company = find_company(&state, &company_id).await?;

    let mut changes = doc! {
        "subscription_status": bson::to_bson(&update.status)?,
        "updated_at": Utc::now().to_rfc3339(),
    };
    if let Some(plan_type) = &update.plan_type {
        changes.insert("plan_type", plan_type.as_str());
    }
    if let Some(days) = update.trial_days_extension {
        if update.status != SubscriptionStatus::Trial {
            return Err(ApiError::bad_request(
                "Trial extension only applies to trial subscriptions",
            ));
        }
        // Extend from the current end when one exists, otherwise from now.
        let base = company.trial_ends_at.unwrap_or_else(Utc::now);
        changes.insert("trial_ends_at", (base + Duration::days(days)).to_rfc3339());
    }

    state
        .store
        .companies()
        .update_one(doc! { "id": company_id.as_str() }, doc! { "$set": changes.clone() }, None)
        .await?;

    state.audit.record(
        "company",
        &company_id,
        "subscription_updated",
        &user,
        Some(company_id.clone()),
        changes,
    );

    let company = find_company(&state, &company_id).await?;
    Ok(ApiResponse::success(company))
}

/// GET /api/admin/metrics - Platform-wide headline numbers.
pub async fn platform_metrics(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<PlatformMetrics> {
    require_super_admin(&user)?;
    let store = &state.store;

    let total_companies = store.companies().count_documents(doc! {}, None).await?;
    let active_companies = store
        .companies()
        .count_documents(doc! { "subscription_status": "active" }, None)
        .await?;
    let trial_companies = store
        .companies()
        .count_documents(doc! { "subscription_status": "trial" }, None)
        .await?;
    let total_users = store.users().count_documents(doc! {}, None).await?;

    let recent_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(10)
        .build();
    let recent_companies = store
        .companies()
        .find(doc! {}, recent_options)
        .await?
        .try_collect()
        .await?;

    Ok(ApiResponse::success(PlatformMetrics {
        total_companies,
        active_companies,
        trial_companies,
        total_users,
        recent_companies,
    }))
}

async fn find_company(state: &AppState, company_id: &str) -> Result<Company, ApiError> {
    state
        .store
        .companies()
        .find_one(doc! { "id": company_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))
}
