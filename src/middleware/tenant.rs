use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use bson::doc;
use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Company, CompanyStatus, SubscriptionStatus, User};
use crate::state::AppState;

/// The tenant the current request operates under.
///
/// `None` means the caller is a SUPER_ADMIN acting across tenants; every
/// other role always carries its own company here, already gated.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Option<Company>);

/// Tenant gating middleware. Runs after [`auth_middleware`] and refuses the
/// request unless the caller's company is in good standing.
///
/// [`auth_middleware`]: crate::middleware::auth::auth_middleware
pub async fn tenant_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let CurrentUser(user) = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("tenant gate reached without an authenticated user");
            ApiError::internal_server_error("Authentication context missing")
        })?;

    let tenant = resolve_tenant(&state.store, &user).await?;
    request.extensions_mut().insert(TenantContext(tenant));
    Ok(next.run(request).await)
}

/// Load and gate the caller's company. SUPER_ADMIN resolves to `None`.
pub async fn resolve_tenant(store: &Store, user: &User) -> Result<Option<Company>, ApiError> {
    if user.role.is_super_admin() {
        return Ok(None);
    }

    let company_id = user.company_id.as_deref().ok_or_else(|| {
        tracing::warn!(user_id = %user.id, "user has no company assignment");
        ApiError::bad_request("User does not belong to any company")
    })?;

    let company = store
        .companies()
        .find_one(doc! { "id": company_id }, None)
        .await?
        .ok_or_else(|| {
            tracing::error!(user_id = %user.id, company_id, "user references a missing company");
            ApiError::not_found("Company not found")
        })?;

    check_company_standing(&company, Utc::now())?;
    Ok(Some(company))
}

/// Decide whether a company may be operated on right now.
///
/// Order matters: a suspended company reports suspension even when its trial
/// has also lapsed.
pub fn check_company_standing(company: &Company, now: DateTime<Utc>) -> Result<(), ApiError> {
    if company.status != CompanyStatus::Active {
        tracing::warn!(company_id = %company.id, "request against suspended company");
        return Err(ApiError::forbidden("Company account is suspended"));
    }

    match company.subscription_status {
        SubscriptionStatus::Active => Ok(()),
        SubscriptionStatus::Trial => {
            // A trial company without an end date is treated as expired
            // rather than granted unlimited access.
            let expired = match company.trial_ends_at {
                Some(ends_at) => now > ends_at,
                None => true,
            };
            if expired {
                tracing::warn!(company_id = %company.id, "request against expired trial");
                Err(ApiError::forbidden(
                    "Trial period has expired. Please upgrade your subscription.",
                ))
            } else {
                Ok(())
            }
        }
        SubscriptionStatus::Suspended | SubscriptionStatus::Cancelled => {
            tracing::warn!(company_id = %company.id, "request against inactive subscription");
            Err(ApiError::forbidden("Subscription is not active"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn company(
        status: CompanyStatus,
        subscription: SubscriptionStatus,
        trial_ends_at: Option<DateTime<Utc>>,
    ) -> Company {
        let now = Utc::now();
        Company {
            id: Uuid::new_v4().to_string(),
            name: "Acme".into(),
            email: "ops@acme.test".into(),
            phone: None,
            logo_url: None,
            primary_color: Some("#3b82f6".into()),
            secondary_color: Some("#1e40af".into()),
            status,
            subscription_status: subscription,
            trial_ends_at,
            trial_started_at: Some(now),
            plan_type: Some("trial".into()),
            active_modules: vec!["crm".into()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn active_subscription_passes() {
        let c = company(CompanyStatus::Active, SubscriptionStatus::Active, None);
        assert!(check_company_standing(&c, Utc::now()).is_ok());
    }

    #[test]
    fn live_trial_passes() {
        let now = Utc::now();
        let c = company(
            CompanyStatus::Active,
            SubscriptionStatus::Trial,
            Some(now + Duration::days(7)),
        );
        assert!(check_company_standing(&c, now).is_ok());
    }

    #[test]
    fn expired_trial_is_forbidden() {
        let now = Utc::now();
        let c = company(
            CompanyStatus::Active,
            SubscriptionStatus::Trial,
            Some(now - Duration::days(1)),
        );
        let err = check_company_standing(&c, now).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.message().contains("Trial"));
    }

    #[test]
    fn trial_without_end_date_is_forbidden() {
        let c = company(CompanyStatus::Active, SubscriptionStatus::Trial, None);
        assert_eq!(
            check_company_standing(&c, Utc::now()).unwrap_err().status_code(),
            403
        );
    }

    #[test]
    fn suspended_company_wins_over_subscription_state() {
        let c = company(CompanyStatus::Suspended, SubscriptionStatus::Active, None);
        let err = check_company_standing(&c, Utc::now()).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.message().contains("suspended"));
    }

    #[test]
    fn cancelled_subscription_is_forbidden() {
        let c = company(CompanyStatus::Active, SubscriptionStatus::Cancelled, None);
        assert_eq!(
            check_company_standing(&c, Utc::now()).unwrap_err().status_code(),
            403
        );
    }
}
