//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod account_service;
mod account_support;
mod account_views;
mod auth_service;
pub mod container;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use account_service::{AccountManager, AccountService};
pub use account_support::{AccountSupport, AccountViewData, ManagerOption, ViewName};
pub use account_views::{
    submit, AccountListing, Create, Delete, Edit, FormView, List, Submission, ViewContext,
};
pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
