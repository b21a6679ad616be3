//! Unit of Work pattern implementation.
//!
//! Centralizes access to every repository behind one injectable object so
//! services depend on a single abstraction instead of individual stores.
//! Writes spanning several repositories go through a `Transaction`, whose
//! repositories all share one database transaction.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, IsolationLevel,
    Statement, TransactionTrait,
};
use std::sync::Arc;

use super::repositories::{GroupRepository, GroupStore, UserRepository, UserStore};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get group repository
    fn groups(&self) -> Arc<dyn GroupRepository>;

    /// Start a transaction.
    ///
    /// Nothing written through it is visible until `commit`; dropping it
    /// uncommitted rolls every write back.
    async fn begin(&self) -> AppResult<Box<dyn Transaction>>;

    /// Check connectivity of the underlying store
    async fn ping(&self) -> AppResult<()>;
}

/// Repositories bound to one open transaction.
#[async_trait]
pub trait Transaction: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn groups(&self) -> Arc<dyn GroupRepository>;

    /// Make every write of this transaction permanent.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: Arc<DatabaseConnection>,
    user_repo: Arc<UserStore>,
    group_repo: Arc<GroupStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let db = Arc::new(db);
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let group_repo = Arc::new(GroupStore::new(db.clone()));
        Self {
            db,
            user_repo,
            group_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.group_repo.clone()
    }

    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        // ReadCommitted for balanced consistency/performance
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
            .await?;

        Ok(Box::new(PersistenceTransaction {
            txn: Arc::new(txn),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

/// Open database transaction shared by its repositories.
pub struct PersistenceTransaction {
    txn: Arc<DatabaseTransaction>,
}

#[async_trait]
impl Transaction for PersistenceTransaction {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(UserStore::new(self.txn.clone()))
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        Arc::new(GroupStore::new(self.txn.clone()))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let txn = Arc::try_unwrap(self.txn)
            .map_err(|_| AppError::internal("transaction committed while a repository still holds it"))?;
        txn.commit().await?;
        Ok(())
    }
}
