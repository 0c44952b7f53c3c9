pub mod auth;
pub mod response;
pub mod tenant;

pub use auth::{auth_middleware, CurrentUser};
pub use response::{ApiResponse, ApiResult};
pub use tenant::{tenant_gate_middleware, TenantContext};
