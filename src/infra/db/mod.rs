//! Database connection and schema management.
//!
//! The schema holds the accounts, the groups and the membership table
//! between them. Migrations also seed the `admin`, `manager` and `user`
//! groups the account forms rely on.

use std::collections::HashSet;

use sea_orm::{Database as SeaDatabase, DatabaseConnection, EntityTrait, QueryOrder};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use crate::config::Config;
use crate::errors::AppResult;

pub mod migrations;

pub use migrations::Migrator;

/// One migration and whether it has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    pub name: String,
    pub applied: bool,
}

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Open a connection and bring the schema up to date.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let db = Self::open(config).await?;

        if let Err(e) = db.upgrade().await {
            tracing::error!(error = %e, "Failed to run migrations");
            return Err(e);
        }

        tracing::info!("Database connected and schema up to date");
        Ok(db)
    }

    /// Open a connection and leave the schema alone.
    pub async fn open(config: &Config) -> AppResult<Self> {
        let connection = SeaDatabase::connect(&config.database_url).await?;
        Ok(Self { connection })
    }

    pub fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Apply every pending migration.
    pub async fn upgrade(&self) -> AppResult<()> {
        Ok(Migrator::up(&self.connection, None).await?)
    }

    /// Revert the most recent migration.
    pub async fn rollback(&self) -> AppResult<()> {
        Ok(Migrator::down(&self.connection, Some(1)).await?)
    }

    /// Drop every table and apply all migrations again.
    pub async fn reset(&self) -> AppResult<()> {
        Ok(Migrator::fresh(&self.connection).await?)
    }

    /// Known migrations in order, flagged with their applied state.
    pub async fn status(&self) -> AppResult<Vec<MigrationEntry>> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                MigrationEntry {
                    applied: applied.contains(&name),
                    name,
                }
            })
            .collect())
    }
}
