//! API middleware.

mod auth;

pub use auth::{auth_middleware, require_admin, require_manager, require_self_or_admin, CurrentUser};
