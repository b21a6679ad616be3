//! Shared types.

mod form;
mod response;
mod session;

pub use form::FormParams;
pub use response::FormErrors;
pub use session::Session;
