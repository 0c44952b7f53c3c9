use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use bson::doc;

use crate::error::ApiError;
use crate::models::UserStatus;
use crate::state::AppState;

/// Authenticated user for the current request, loaded from the database.
///
/// Handlers read role, company and status from this record, never from the
/// token payload. A token issued before a role change or deactivation carries
/// stale claims until it expires.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub crate::models::User);

/// Extract a bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication middleware: verifies the JWT, resolves the persisted user
/// record and stores it as a request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).ok_or_else(|| {
        tracing::debug!("missing or malformed Authorization header");
        ApiError::unauthorized("Missing authentication token")
    })?;

    let claims = state.tokens.verify(token)?;

    let user = state
        .store
        .users()
        .find_one(doc! { "id": &claims.sub }, None)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %claims.sub, "token subject has no user record");
            ApiError::unauthorized("Invalid token")
        })?;

    if user.status != UserStatus::Active {
        tracing::warn!(user_id = %user.id, "inactive user attempted access");
        return Err(ApiError::forbidden("User account is inactive"));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
