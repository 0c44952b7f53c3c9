use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    #[serde(other)]
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Suspended,
    #[serde(other)]
    Cancelled,
}

/// Tenant record. All business data is partitioned by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    pub status: CompanyStatus,
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trial_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub active_modules: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public self-registration payload: a company plus its first admin.
#[derive(Debug, Deserialize)]
pub struct RegisterCompany {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default)]
    pub selected_modules: Vec<String>,
}

/// Partial update applied by SUPER_ADMIN (full) or COMPANY_ADMIN (branding).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CompanyStatus>,
}

/// Subscription state change, optionally extending an ongoing trial.
#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdate {
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub trial_days_extension: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_use_lowercase_wire_strings() {
        assert_eq!(serde_json::to_string(&CompanyStatus::Active).unwrap(), "\"active\"");
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        let status: SubscriptionStatus = serde_json::from_str("\"trial\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Trial);
    }

    #[test]
    fn unknown_company_status_reads_as_suspended() {
        let status: CompanyStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, CompanyStatus::Suspended);
    }
}
