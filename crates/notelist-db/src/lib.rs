//! # notelist-db
//!
//! PostgreSQL database layer for notelist.
//!
//! This crate provides:
//! - Connection pool management and the startup lifecycle
//! - Forward-only, idempotent schema migrations
//! - The permission-checked note repository
//!
//! ## Example
//!
//! ```rust,ignore
//! use notelist_db::{AuthorizationSet, Database, NewNote, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("postgres://localhost/notelist").await?;
//!     let auths: AuthorizationSet = ["team-a"].into();
//!
//!     let id = db.notes.create(NewNote::new("groceries", "milk, eggs", 1), &auths).await?;
//!     println!("Created note: {}", id);
//!
//!     db.close().await;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod migrations;
pub mod notes;
pub mod pool;

#[cfg(test)]
mod tests;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use notelist_core::*;

pub use config::DatabaseConfig;
pub use migrations::{applied_migrations, AppliedMigration, Migration, Migrator, MIGRATIONS};
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, ping, PoolConfig};

use sqlx::postgres::PgConnectOptions;
use tracing::info;

/// Combined database context: the shared pool and the repositories on it.
///
/// Cloning is cheap and shares the pool. Obtain one with [`Database::open`]
/// and release it once with [`Database::close`].
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for permission-checked CRUD operations.
    pub notes: PgNoteRepository,
}

impl Database {
    /// Wrap an already-migrated connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to `database_url`, check liveness and apply pending migrations.
    ///
    /// Any failure is fatal for startup; nothing is retried.
    pub async fn open(database_url: &str) -> Result<Self> {
        Self::open_with(pool::parse_database_url(database_url)?, PoolConfig::default()).await
    }

    /// Open from a loaded [`DatabaseConfig`].
    pub async fn open_with_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open_with(config.connect_options()?, config.pool.clone()).await
    }

    /// Like [`Database::open`], with explicit connect options and pool settings.
    pub async fn open_with(options: PgConnectOptions, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(options, config).await?;

        if let Err(e) = ping(&pool).await {
            pool.close().await;
            return Err(e);
        }

        if let Err(e) = Migrator::default().apply(&pool).await {
            pool.close().await;
            return Err(e);
        }

        log_pool_metrics(&pool);
        Ok(Self::new(pool))
    }

    /// Close every pooled connection. Best effort; never fails.
    pub async fn close(self) {
        self.pool.close().await;
        info!(
            subsystem = "database",
            component = "pool",
            op = "close",
            "Database connection pool closed"
        );
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
