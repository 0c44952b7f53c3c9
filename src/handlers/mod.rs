pub mod activities;
pub mod admin;
pub mod clients;
pub mod dashboard;
pub mod logs;
pub mod payments;
pub mod phases;
pub mod projects;
pub mod public;
pub mod session;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use crate::models::User;

/// Company a write lands in. Mutations always use the caller's own company;
/// SUPER_ADMIN provisions tenant data through the admin surface instead.
pub(crate) fn own_company_id(user: &User) -> Result<String, ApiError> {
    user.company_id
        .clone()
        .ok_or_else(|| ApiError::bad_request("Cross-tenant access requires an explicit company context"))
}
