use anyhow::Result;
use chrono::{Duration, Utc};
use pactum_api::middleware::tenant::check_company_standing;
use pactum_api::models::Company;
use serde_json::json;

/// Build a company the way it would come back from the store: through serde,
/// so wire-string statuses and the fallback variants are exercised too.
fn company_from_json(
    status: &str,
    subscription_status: &str,
    trial_ends_at: Option<String>,
) -> Result<Company> {
    let now = Utc::now().to_rfc3339();
    let value = json!({
        "id": "company-1",
        "name": "Acme",
        "email": "ops@acme.test",
        "status": status,
        "subscription_status": subscription_status,
        "trial_ends_at": trial_ends_at,
        "created_at": now,
        "updated_at": now,
    });
    Ok(serde_json::from_value(value)?)
}

#[test]
fn active_company_with_active_subscription_passes() -> Result<()> {
    let company = company_from_json("active", "active", None)?;
    assert!(check_company_standing(&company, Utc::now()).is_ok());
    Ok(())
}

#[test]
fn running_trial_passes_until_its_end_date() -> Result<()> {
    let now = Utc::now();
    let company = company_from_json(
        "active",
        "trial",
        Some((now + Duration::days(3)).to_rfc3339()),
    )?;
    assert!(check_company_standing(&company, now).is_ok());
    Ok(())
}

#[test]
fn expired_trial_is_rejected_with_403() -> Result<()> {
    let now = Utc::now();
    let company = company_from_json(
        "active",
        "trial",
        Some((now - Duration::hours(1)).to_rfc3339()),
    )?;
    let err = check_company_standing(&company, now).unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert!(err.message().contains("Trial"));
    Ok(())
}

#[test]
fn suspended_company_is_rejected_even_with_active_subscription() -> Result<()> {
    let company = company_from_json("suspended", "active", None)?;
    let err = check_company_standing(&company, Utc::now()).unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert!(err.message().contains("suspended"));
    Ok(())
}

#[test]
fn unknown_company_status_gates_as_suspended() -> Result<()> {
    // Forward compatibility: a status string this build does not know
    // must fail closed, not open.
    let company = company_from_json("archived", "active", None)?;
    assert_eq!(
        check_company_standing(&company, Utc::now()).unwrap_err().status_code(),
        403
    );
    Ok(())
}

#[test]
fn cancelled_and_suspended_subscriptions_are_rejected() -> Result<()> {
    for subscription in ["cancelled", "suspended"] {
        let company = company_from_json("active", subscription, None)?;
        let err = check_company_standing(&company, Utc::now()).unwrap_err();
        assert_eq!(err.status_code(), 403, "subscription {subscription}");
    }
    Ok(())
}
