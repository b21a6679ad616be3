//! Service Container - Centralized service access.
//!
//! Builds every service from the infrastructure handles and hands them out
//! as trait objects.

use std::sync::Arc;

use super::{AccountManager, AccountService, AccountSupport, AuthService, Authenticator};
use crate::config::Config;
use crate::infra::{Directory, LdapDirectory, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get account service
    fn accounts(&self) -> Arc<dyn AccountService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    account_service: Arc<dyn AccountService>,
}

impl Services {
    /// Create a new service container with all services initialized
    pub fn new(auth_service: Arc<dyn AuthService>, account_service: Arc<dyn AccountService>) -> Self {
        Self {
            auth_service,
            account_service,
        }
    }

    /// Create service container from database connection and config.
    ///
    /// The LDAP directory is only wired in when `use_ldap` is set.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let directory = config
            .use_ldap
            .then(|| Arc::new(LdapDirectory::new(config.ldap.clone())) as Arc<dyn Directory>);

        let uow = Arc::new(Persistence::new(db));
        let support = Arc::new(AccountSupport::new(uow, directory, config.use_ldap));
        let account_service: Arc<dyn AccountService> = Arc::new(AccountManager::new(support));
        let auth_service = Arc::new(Authenticator::new(account_service.clone(), config));

        Self {
            auth_service,
            account_service,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }
}
