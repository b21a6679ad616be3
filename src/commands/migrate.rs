//! Migrate command - Database migration management.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // Manual control: nothing runs until the action says so
    let db = Database::open(&config).await?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.upgrade().await?;
            tracing::info!("Migrations completed successfully");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback().await?;
            tracing::info!("Rollback completed successfully");
        }
        MigrateAction::Status => {
            for entry in db.status().await? {
                let state = if entry.applied { "applied" } else { "pending" };
                println!("{}: {}", entry.name, state);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Resetting database and running all migrations...");
            db.reset().await?;
            tracing::info!("Fresh migrations completed, default groups seeded");
        }
    }

    Ok(())
}
