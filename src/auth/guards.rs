//! Declarative role-membership guards. Each guard returns a generic message
//! to the caller; the required-vs-actual context goes to the server log.

use crate::error::ApiError;
use crate::models::User;

pub fn require_super_admin(user: &User) -> Result<(), ApiError> {
    if !user.role.is_super_admin() {
        tracing::warn!(
            user_id = %user.id,
            actual = user.role.as_str(),
            "SUPER_ADMIN required"
        );
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(())
}

pub fn require_company_admin(user: &User) -> Result<(), ApiError> {
    if !user.role.is_company_admin_or_above() {
        tracing::warn!(
            user_id = %user.id,
            actual = user.role.as_str(),
            "COMPANY_ADMIN or above required"
        );
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            email: "user@acme.test".to_string(),
            password: String::new(),
            name: "Test".to_string(),
            role,
            company_id: (!role.is_super_admin()).then(|| Uuid::new_v4().to_string()),
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn super_admin_guard_passes_only_platform_role() {
        assert!(require_super_admin(&user_with_role(Role::SuperAdmin)).is_ok());
        assert!(require_super_admin(&user_with_role(Role::CompanyAdmin)).is_err());
        assert!(require_super_admin(&user_with_role(Role::User)).is_err());
        assert!(require_super_admin(&user_with_role(Role::TeamMember)).is_err());
    }

    #[test]
    fn company_admin_guard_passes_admin_roles() {
        assert!(require_company_admin(&user_with_role(Role::SuperAdmin)).is_ok());
        assert!(require_company_admin(&user_with_role(Role::CompanyAdmin)).is_ok());
        assert!(require_company_admin(&user_with_role(Role::User)).is_err());
        assert!(require_company_admin(&user_with_role(Role::TeamMember)).is_err());
    }
}
