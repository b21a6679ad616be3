//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, FlashStore};
use crate::services::{AccountService, AuthService, ServiceContainer, Services};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// Account views
    pub accounts: Arc<dyn AccountService>,
    /// Flash messages, keyed by account id
    pub flash: Arc<dyn FlashStore>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: &Database, cache: Arc<Cache>, config: Config) -> Self {
        let container = Services::from_connection(database.connection(), config);

        Self {
            auth_service: container.auth(),
            accounts: container.accounts(),
            flash: cache,
        }
    }

    /// Create new application state with manually injected services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        accounts: Arc<dyn AccountService>,
        flash: Arc<dyn FlashStore>,
    ) -> Self {
        Self {
            auth_service,
            accounts,
            flash,
        }
    }
}
