pub mod guards;
pub mod password;
pub mod token;

pub use guards::{require_company_admin, require_super_admin};
pub use token::{Claims, TokenError, TokenService};
