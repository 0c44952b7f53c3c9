use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::models::Role;

/// Identity claims carried by a signed bearer token. Stateless: validity is
/// decided entirely by signature and expiry at verification time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies session tokens with a process-wide symmetric secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            expiry_hours: security.jwt_expiry_hours as i64,
        }
    }

    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        company_id: Option<String>,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            company_id,
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        // Expiry is absolute: no clock-skew leeway past `exp`
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn security(expiry_hours: u64) -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "unit-test-secret".to_string(),
            jwt_expiry_hours: expiry_hours,
            trial_days: 14,
            enable_cors: false,
            cors_origins: vec![],
        }
    }

    #[test]
    fn issued_token_verifies_with_original_claims() {
        let service = TokenService::new(&security(24));
        let user_id = Uuid::new_v4().to_string();
        let company_id = Some(Uuid::new_v4().to_string());

        let token = service
            .issue(&user_id, "admin@acme.test", Role::CompanyAdmin, company_id.clone())
            .unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "admin@acme.test");
        assert_eq!(claims.role, Role::CompanyAdmin);
        assert_eq!(claims.company_id, company_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_fails_with_expired_kind() {
        let service = TokenService::new(&security(24));
        let now = Utc::now();
        // Expiry well in the past
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "user@acme.test".to_string(),
            role: Role::User,
            company_id: None,
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        match service.verify(&token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other.map(|c| c.email)),
        }
    }

    #[test]
    fn token_expired_seconds_ago_is_rejected() {
        let service = TokenService::new(&security(24));
        let now = Utc::now();
        // Just past expiry: must fail immediately, not after a grace window
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "user@acme.test".to_string(),
            role: Role::User,
            company_id: None,
            exp: (now - Duration::seconds(30)).timestamp(),
            iat: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        match service.verify(&token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other.map(|c| c.email)),
        }
    }

    #[test]
    fn tampered_token_fails_with_invalid_kind() {
        let service = TokenService::new(&security(24));
        let token = service
            .issue(&Uuid::new_v4().to_string(), "user@acme.test", Role::User, None)
            .unwrap();

        // Flip one character in the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        match service.verify(&tampered) {
            Err(TokenError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {:?}", other.map(|c| c.email)),
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(&SecurityConfig {
            jwt_secret: "other-secret".to_string(),
            jwt_expiry_hours: 24,
            trial_days: 14,
            enable_cors: false,
            cors_origins: vec![],
        });
        let verifier = TokenService::new(&security(24));

        let token = issuer
            .issue(&Uuid::new_v4().to_string(), "user@acme.test", Role::User, None)
            .unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }
}
