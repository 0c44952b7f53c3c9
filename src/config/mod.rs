use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub mongo_url: String,
    pub db_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub trial_days: i64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub retention_days: i64,
    pub sweep_interval_secs: u64,
    pub query_max_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("MONGO_URL") {
            self.database.mongo_url = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.db_name = v;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRATION_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("TRIAL_DAYS") {
            self.security.trial_days = v.parse().unwrap_or(self.security.trial_days);
        }
        if let Ok(v) = env::var("ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Audit overrides
        if let Ok(v) = env::var("AUDIT_RETENTION_DAYS") {
            self.audit.retention_days = v.parse().unwrap_or(self.audit.retention_days);
        }
        if let Ok(v) = env::var("AUDIT_SWEEP_INTERVAL_SECS") {
            self.audit.sweep_interval_secs = v.parse().unwrap_or(self.audit.sweep_interval_secs);
        }
        if let Ok(v) = env::var("AUDIT_QUERY_MAX_LIMIT") {
            self.audit.query_max_limit = v.parse().unwrap_or(self.audit.query_max_limit);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                mongo_url: "mongodb://localhost:27017".to_string(),
                db_name: "pactum_dev".to_string(),
            },
            security: SecurityConfig {
                // Demo-only secret, expected to be overridden via JWT_SECRET
                jwt_secret: "pactum-secret-key-2026-demo".to_string(),
                jwt_expiry_hours: 24,
                trial_days: 14,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            audit: AuditConfig {
                retention_days: 30,
                sweep_interval_secs: 3600,
                query_max_limit: 500,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                mongo_url: "mongodb://localhost:27017".to_string(),
                db_name: "pactum_staging".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                trial_days: 14,
                enable_cors: true,
                cors_origins: vec!["https://staging.pactum.example".to_string()],
            },
            audit: AuditConfig {
                retention_days: 30,
                sweep_interval_secs: 3600,
                query_max_limit: 200,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                mongo_url: "mongodb://localhost:27017".to_string(),
                db_name: "pactum".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                trial_days: 14,
                enable_cors: true,
                cors_origins: vec!["https://app.pactum.example".to_string()],
            },
            audit: AuditConfig {
                retention_days: 30,
                sweep_interval_secs: 3600,
                query_max_limit: 100,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert_eq!(config.security.trial_days, 14);
        assert_eq!(config.audit.retention_days, 30);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Production never ships a baked-in secret
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }
}
