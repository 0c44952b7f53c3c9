//! Session introspection for authenticated callers.

use axum::extract::State;
use axum::Extension;
use bson::doc;

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::UserPublic;
use crate::state::AppState;

/// GET /api/auth/me - The caller's own profile, credential digest omitted.
pub async fn me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<UserPublic> {
    let company_name = match &user.company_id {
        Some(company_id) => state
            .store
            .companies()
            .find_one(doc! { "id": company_id }, None)
            .await?
            .map(|c| c.name),
        None => None,
    };

    Ok(ApiResponse::success(UserPublic::from_user(&user, company_name)))
}
