pub mod auth;
pub mod require_admin;
pub mod response;
pub mod trusted;

pub use auth::{auth_gate_middleware, classify, Guard};
pub use require_admin::require_admin;
pub use response::{ApiResponse, ApiResult};
pub use trusted::TrustedPrincipal;
