//! Database layer for Ledgerwatch.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger and reconciliation tables
//! - Repositories that feed ledger rows to `ledgerwatch-core` and persist results
//! - [`LedgerEngine`], the operator surface with deadlines and the monitoring guard
//! - Database migrations

pub mod engine;
pub mod entities;
pub mod migration;
pub mod repositories;

pub use engine::LedgerEngine;
pub use migration::Migrator;

use std::time::Duration;

use ledgerwatch_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(
        max_connections = config.max_connections,
        "Database connection established"
    );
    Ok(db)
}
