//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.
//!
//! Contains: Entities, Value Objects, Domain Services.

pub mod group;
pub mod password;
pub mod user;

pub use group::{Group, GroupDelta};
pub use password::Password;
pub use user::{User, UserResponse, UserRole};
