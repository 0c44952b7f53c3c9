pub mod activity;
pub mod audit;
pub mod client;
pub mod company;
pub mod payment;
pub mod phase;
pub mod project;
pub mod task;
pub mod user;

pub use activity::{Activity, ActivityCreate, ActivityQuery, ActivityUpdate};
pub use audit::{AuditLogEntry, AuditQuery};
pub use client::{Client, ClientCreate, ClientUpdate};
pub use company::{
    Company, CompanyStatus, CompanyUpdate, RegisterCompany, SubscriptionStatus, SubscriptionUpdate,
};
pub use payment::{Payment, PaymentQuery, PaymentUpdate};
pub use phase::{Phase, PhaseQuery, PhaseUpdate};
pub use project::{Project, ProjectUpdate};
pub use task::{CommentCreate, Task, TaskCreate, TaskQuery, TaskUpdate};
pub use user::{LoginRequest, Role, User, UserCreate, UserPublic, UserStatus};

use bson::Document;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment appended to tasks and phases as an embedded sub-document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: chrono::DateTime<Utc>,
}

impl Comment {
    pub fn new(text: String, user_id: String, user_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            user_id,
            user_name,
            created_at: Utc::now(),
        }
    }
}

/// Lower a typed partial-update struct into a `$set` document.
///
/// Update structs only declare mutable fields, so protected fields (id,
/// tenant ownership, created_by, created_at) can never reach the store.
/// `None` fields are skipped at serialization time; `updated_at` is always
/// refreshed.
pub fn to_set_document<T: Serialize>(update: &T) -> Result<Document, bson::ser::Error> {
    let mut doc = bson::to_document(update)?;
    doc.insert("updated_at", Utc::now().to_rfc3339());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct SampleUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    }

    #[test]
    fn set_document_skips_unset_fields() {
        let update = SampleUpdate { name: Some("Acme".into()), notes: None };
        let doc = to_set_document(&update).unwrap();
        assert_eq!(doc.get_str("name").unwrap(), "Acme");
        assert!(!doc.contains_key("notes"));
        assert!(doc.contains_key("updated_at"));
    }

    #[test]
    fn set_document_never_contains_protected_fields() {
        let update = ClientUpdate {
            name: Some("Acme".into()),
            ..Default::default()
        };
        let doc = to_set_document(&update).unwrap();
        for protected in ["id", "company_id", "created_by", "created_at"] {
            assert!(!doc.contains_key(protected), "{protected} must not be settable");
        }
    }
}
