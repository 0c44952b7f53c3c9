use bson::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one state-changing action. Append-only; purged by the
/// retention sweeper after the configured window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    /// Acting user id, or "system" for platform-initiated actions
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub changes: Document,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        company_id: Option<String>,
        changes: Document,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            company_id,
            changes,
            timestamp: Utc::now(),
        }
    }
}

/// Optional query-string filters for the audit read endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}
