//! Unauthenticated endpoints: company self-registration, login and the
//! module catalog.

use axum::extract::State;
use axum::Json;
use bson::doc;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{
    Company, CompanyStatus, LoginRequest, RegisterCompany, Role, SubscriptionStatus, User,
    UserPublic, UserStatus,
};
use crate::state::AppState;

/// Login and registration responses share this shape.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserPublic,
}

/// POST /api/public/register-company - Self-service tenant signup.
///
/// Creates the company on a trial subscription together with its first
/// COMPANY_ADMIN user, then returns a session for that admin.
pub async fn register_company(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCompany>,
) -> ApiResult<TokenResponse> {
    let store = &state.store;

    if store
        .companies()
        .find_one(doc! { "email": &payload.email }, None)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Company email already registered"));
    }
    if store
        .users()
        .find_one(doc! { "email": &payload.admin_email }, None)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Admin email already registered"));
    }

    let now = Utc::now();
    let trial_days = state.config.security.trial_days;
    let company = Company {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        logo_url: None,
        primary_color: Some("#3b82f6".to_string()),
        secondary_color: Some("#1e40af".to_string()),
        status: CompanyStatus::Active,
        subscription_status: SubscriptionStatus::Trial,
        trial_ends_at: Some(now + Duration::days(trial_days)),
        trial_started_at: Some(now),
        plan_type: Some("trial".to_string()),
        active_modules: payload.selected_modules,
        created_at: now,
        updated_at: now,
    };

    let admin = User {
        id: Uuid::new_v4().to_string(),
        email: payload.admin_email,
        password: password::hash(&payload.admin_password)?,
        name: payload.admin_name,
        role: Role::CompanyAdmin,
        company_id: Some(company.id.clone()),
        status: UserStatus::Active,
        created_at: now,
    };

    store.companies().insert_one(&company, None).await?;
    store.users().insert_one(&admin, None).await?;

    state.audit.record_system(
        "company",
        &company.id,
        "registered",
        Some(company.id.clone()),
        doc! { "name": &company.name, "admin_email": &admin.email },
    );
    tracing::info!(company_id = %company.id, "company registered");

    let access_token = state
        .tokens
        .issue(&admin.id, &admin.email, admin.role, admin.company_id.clone())
        .map_err(|e| {
            tracing::error!("failed to issue token after registration: {}", e);
            ApiError::internal_server_error("Failed to create session")
        })?;

    Ok(ApiResponse::created(TokenResponse {
        access_token,
        token_type: "bearer",
        user: UserPublic::from_user(&admin, Some(company.name.clone())),
    }))
}

/// POST /api/auth/login - Credential check and session issue.
///
/// Unknown email and wrong password return the same 401 body. Company
/// standing is not checked here; the tenant gate enforces it per request.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let user = state
        .store
        .users()
        .find_one(doc! { "email": &payload.email }, None)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !password::verify(&payload.password, &user.password) {
        tracing::warn!(email = %payload.email, "failed login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if user.status != UserStatus::Active {
        return Err(ApiError::forbidden("User account is inactive"));
    }

    let company_name = match &user.company_id {
        Some(company_id) => state
            .store
            .companies()
            .find_one(doc! { "id": company_id }, None)
            .await?
            .map(|c| c.name),
        None => None,
    };

    let access_token = state
        .tokens
        .issue(&user.id, &user.email, user.role, user.company_id.clone())
        .map_err(|e| {
            tracing::error!("failed to issue token at login: {}", e);
            ApiError::internal_server_error("Failed to create session")
        })?;

    tracing::debug!(user_id = %user.id, "login succeeded");
    Ok(ApiResponse::success(TokenResponse {
        access_token,
        token_type: "bearer",
        user: UserPublic::from_user(&user, company_name),
    }))
}

/// GET /api/modules - Static catalog of licensable modules.
pub async fn list_modules() -> ApiResult<Value> {
    Ok(ApiResponse::success(module_catalog()))
}

pub(crate) fn module_catalog() -> Value {
    json!([
        { "id": "crm", "name": "CRM", "description": "Clients, contacts and sales activities" },
        { "id": "projects", "name": "Projects", "description": "Projects, phases and weekly task boards" },
        { "id": "billing", "name": "Billing", "description": "Phase-linked payments and collection status" },
        { "id": "hr", "name": "Human Resources", "description": "Team directory and role assignment" },
        { "id": "reports", "name": "Reports", "description": "Cross-module dashboards and KPIs" }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_module_ids_are_unique() {
        let catalog = module_catalog();
        let ids: Vec<&str> = catalog
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }
}
