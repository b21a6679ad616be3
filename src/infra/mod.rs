//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections and repositories
//! - The LDAP directory
//! - Flash message storage (Redis)

pub mod cache;
pub mod db;
pub mod directory;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, FlashStore};
pub use db::{Database, Migrator};
pub use directory::{Directory, DirectoryManager, LdapDirectory};
pub use repositories::{GroupRepository, GroupStore, UserRepository, UserStore};
pub use unit_of_work::{Persistence, PersistenceTransaction, Transaction, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockFlashStore;
#[cfg(any(test, feature = "test-utils"))]
pub use directory::MockDirectory;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockGroupRepository, MockUserRepository};
