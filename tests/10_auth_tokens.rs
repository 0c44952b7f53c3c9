use anyhow::Result;
use pactum_api::auth::TokenService;
use pactum_api::config::SecurityConfig;
use pactum_api::error::ApiError;
use pactum_api::models::Role;

fn security(secret: &str) -> SecurityConfig {
    SecurityConfig {
        jwt_secret: secret.to_string(),
        jwt_expiry_hours: 24,
        trial_days: 14,
        enable_cors: false,
        cors_origins: vec![],
    }
}

#[test]
fn token_round_trip_preserves_identity_claims() -> Result<()> {
    let service = TokenService::new(&security("integration-secret"));
    let token = service.issue(
        "user-123",
        "admin@acme.test",
        Role::CompanyAdmin,
        Some("company-9".to_string()),
    )?;

    let claims = service.verify(&token)?;
    assert_eq!(claims.sub, "user-123");
    assert_eq!(claims.email, "admin@acme.test");
    assert_eq!(claims.role, Role::CompanyAdmin);
    assert_eq!(claims.company_id.as_deref(), Some("company-9"));
    assert!(claims.exp > claims.iat);
    Ok(())
}

#[test]
fn super_admin_tokens_carry_no_company() -> Result<()> {
    let service = TokenService::new(&security("integration-secret"));
    let token = service.issue("root-1", "root@pactum.test", Role::SuperAdmin, None)?;
    let claims = service.verify(&token)?;
    assert_eq!(claims.company_id, None);
    assert!(claims.role.is_super_admin());
    Ok(())
}

#[test]
fn tokens_do_not_verify_across_secrets() -> Result<()> {
    let issuer = TokenService::new(&security("secret-a"));
    let verifier = TokenService::new(&security("secret-b"));

    let token = issuer.issue("user-1", "user@acme.test", Role::User, None)?;
    let err = verifier.verify(&token).unwrap_err();

    // Signature failures surface to clients as a generic 401
    let api_err: ApiError = err.into();
    assert_eq!(api_err.status_code(), 401);
    assert_eq!(api_err.message(), "Invalid token");
    Ok(())
}

#[test]
fn tampered_token_is_rejected_with_401() -> Result<()> {
    let service = TokenService::new(&security("integration-secret"));
    let token = service.issue("user-1", "user@acme.test", Role::TeamMember, None)?;

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let api_err: ApiError = service.verify(&tampered).unwrap_err().into();
    assert_eq!(api_err.status_code(), 401);
    Ok(())
}
