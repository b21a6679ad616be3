//! Vacation accounts - account management of a leave tracking service
//!
//! Form-driven creation, edition and deletion of user accounts, with group
//! membership reconciliation and optional mirroring into an LDAP directory.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Accounts, groups and passwords
//! - **services**: Account views and authentication
//! - **infra**: Database, Redis flash store and LDAP directory
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Form parameters, session and responses
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Group, Password, User, UserRole};
pub use errors::{AppError, AppResult};
