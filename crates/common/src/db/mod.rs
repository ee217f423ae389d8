//! Database layer for Colloquia
//!
//! Provides:
//! - SeaORM entity models
//! - Schema bootstrap (tables + composite unique indexes)
//! - Repository pattern for data access
//! - Connection management

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Single-writer store handle
///
/// The core assumes one relational store; every merge and every
/// single-document import runs in its own transaction on this connection.
#[derive(Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Connect using the given configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Wrap an already-open connection (used by tests)
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Borrow the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        use sea_orm::ConnectionTrait;

        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
