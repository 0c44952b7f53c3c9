//! Tenant user management, restricted to COMPANY_ADMIN.

use axum::extract::State;
use axum::{Extension, Json};
use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use uuid::Uuid;

use crate::auth::guards::require_company_admin;
use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, TenantContext};
use crate::models::{Role, User, UserCreate, UserPublic, UserStatus};
use crate::state::AppState;

/// GET /api/company/users - Roster of the caller's company.
pub async fn list_company_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Vec<UserPublic>> {
    require_company_admin(&user)?;
    let company = tenant.ok_or_else(|| {
        ApiError::bad_request("Cross-tenant access requires an explicit company context")
    })?;

    let users: Vec<User> = state
        .store
        .users()
        .find(doc! { "company_id": company.id.as_str() }, None)
        .await?
        .try_collect()
        .await?;

    let roster = users
        .iter()
        .map(|u| UserPublic::from_user(u, Some(company.name.clone())))
        .collect();
    Ok(ApiResponse::success(roster))
}

/// POST /api/company/users - Create a user inside the caller's company.
///
/// SUPER_ADMIN cannot be granted here; an escalation attempt lands as a
/// plain USER.
pub async fn create_company_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(payload): Json<UserCreate>,
) -> ApiResult<UserPublic> {
    require_company_admin(&user)?;
    let company = tenant.ok_or_else(|| {
        ApiError::bad_request("Cross-tenant access requires an explicit company context")
    })?;

    if state
        .store
        .users()
        .find_one(doc! { "email": &payload.email }, None)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let role = match payload.role {
        Role::SuperAdmin => {
            tracing::warn!(user_id = %user.id, "attempted SUPER_ADMIN grant via tenant endpoint");
            Role::User
        }
        other => other,
    };

    let new_user = User {
        id: Uuid::new_v4().to_string(),
        email: payload.email,
        password: password::hash(&payload.password)?,
        name: payload.name,
        role,
        company_id: Some(company.id.clone()),
        status: UserStatus::Active,
        created_at: Utc::now(),
    };
    state.store.users().insert_one(&new_user, None).await?;

    state.audit.record(
        "user",
        &new_user.id,
        "created",
        &user,
        Some(company.id.clone()),
        doc! { "email": &new_user.email, "role": new_user.role.as_str() },
    );

    Ok(ApiResponse::created(UserPublic::from_user(
        &new_user,
        Some(company.name.clone()),
    )))
}
