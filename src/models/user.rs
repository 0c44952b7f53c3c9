use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of roles; serialized exactly as the wire/database strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    User,
    TeamMember,
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn is_company_admin_or_above(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::CompanyAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::CompanyAdmin => "COMPANY_ADMIN",
            Role::User => "USER",
            Role::TeamMember => "TEAM_MEMBER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    #[serde(other)]
    Inactive,
}

/// Canonical user record. `company_id` is None only for SUPER_ADMIN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// bcrypt digest, never returned to clients
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// Client-facing user summary without the credential digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl UserPublic {
    pub fn from_user(user: &User, company_name: Option<String>) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            company_id: user.company_id.clone(),
            company_name,
        }
    }
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for tenant-admin user creation.
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_wire_strings() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::TeamMember).unwrap(), "\"TEAM_MEMBER\"");
        let role: Role = serde_json::from_str("\"COMPANY_ADMIN\"").unwrap();
        assert_eq!(role, Role::CompanyAdmin);
    }

    #[test]
    fn unknown_user_status_reads_as_inactive() {
        let status: UserStatus = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(status, UserStatus::Inactive);
    }
}
