//! Forward-only schema migrations.
//!
//! Steps are applied in declaration order, each at most once per database.
//! Completed step names are recorded in [`MIGRATIONS_TABLE`], so running the
//! migrator on every startup is safe. Steps are never rolled back, and a
//! shipped step must never be edited or reordered; append a new one instead.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};

use notelist_core::{Error, Result};

/// Bookkeeping table holding the names of applied steps.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// Session advisory lock key held for the duration of a run.
const MIGRATION_LOCK_KEY: i64 = 0x6e6f_7465_6c69_7374; // "notelist"

const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    name       TEXT PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const SETUP_NOTES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS note_lists (
    id          SERIAL,
    name        TEXT,
    description TEXT,
    PRIMARY KEY(id)
);

CREATE TABLE IF NOT EXISTS notes (
    id          SERIAL,
    name        TEXT,
    description TEXT,
    list_id     INTEGER NOT NULL,
    PRIMARY KEY(id),
    CONSTRAINT fk_list FOREIGN KEY(list_id) REFERENCES note_lists(id)
);

CREATE TABLE IF NOT EXISTS note_permissions (
    list_id INTEGER NOT NULL,
    favored TEXT NOT NULL,
    PRIMARY KEY(list_id, favored),
    CONSTRAINT fk_list FOREIGN KEY(list_id) REFERENCES note_lists(id)
);
"#;

/// One named schema change.
///
/// The body runs on a plain connection with no surrounding transaction.
/// A body that must not run inside any transaction block at all (e.g.
/// `CREATE INDEX CONCURRENTLY`) has to be a single statement, since a
/// multi-statement body is executed as one implicit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// The shipped migration steps, oldest first. Append only.
pub const MIGRATIONS: &[Migration] = &[Migration {
    name: "Setup note-lists, note and note_permissions",
    sql: SETUP_NOTES_SQL,
}];

/// A row of the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Applies an ordered list of [`Migration`] steps.
#[derive(Debug, Clone)]
pub struct Migrator {
    steps: Vec<Migration>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self {
            steps: MIGRATIONS.to_vec(),
        }
    }
}

impl Migrator {
    /// Build a migrator over `steps`. Names must be non-empty and unique.
    pub fn new(steps: impl Into<Vec<Migration>>) -> Result<Self> {
        let steps = steps.into();
        let mut seen = HashSet::new();
        for step in &steps {
            if step.name.trim().is_empty() {
                return Err(Error::Config("migration name must not be empty".to_string()));
            }
            if !seen.insert(step.name) {
                return Err(Error::Config(format!(
                    "duplicate migration name {:?}",
                    step.name
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Migration] {
        &self.steps
    }

    /// Apply every step not yet recorded, in order.
    ///
    /// Returns the names of the steps applied by this run; empty when the
    /// schema was already current. A failing step aborts the run with
    /// [`Error::Migration`] naming it, leaving earlier steps recorded.
    pub async fn apply(&self, pool: &PgPool) -> Result<Vec<&'static str>> {
        let start = Instant::now();
        let mut conn = pool.acquire().await.map_err(bookkeeping_error)?;

        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *conn)
            .await
            .map_err(bookkeeping_error)?;

        let outcome = self.apply_locked(&mut conn).await;

        let unlocked = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *conn)
            .await;
        if let Err(e) = unlocked {
            warn!(
                subsystem = "database",
                component = "migrator",
                error = %e,
                "Failed to release migration lock, discarding connection"
            );
            // Closing the session releases the lock server-side.
            drop(conn.detach());
        }

        let applied = outcome?;
        info!(
            subsystem = "database",
            component = "migrator",
            op = "apply",
            applied = applied.len(),
            total = self.steps.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Schema migrations complete"
        );
        Ok(applied)
    }

    async fn apply_locked(&self, conn: &mut PgConnection) -> Result<Vec<&'static str>> {
        sqlx::raw_sql(CREATE_MIGRATIONS_TABLE_SQL)
            .execute(&mut *conn)
            .await
            .map_err(bookkeeping_error)?;

        let recorded: HashSet<String> =
            sqlx::query_scalar::<_, String>("SELECT name FROM schema_migrations")
                .fetch_all(&mut *conn)
                .await
                .map_err(bookkeeping_error)?
                .into_iter()
                .collect();

        let mut applied = Vec::new();
        for step in &self.steps {
            if recorded.contains(step.name) {
                debug!(
                    subsystem = "database",
                    component = "migrator",
                    migration = step.name,
                    "Migration already applied, skipping"
                );
                continue;
            }

            let step_start = Instant::now();
            sqlx::raw_sql(step.sql)
                .execute(&mut *conn)
                .await
                .map_err(step_error(step.name))?;

            sqlx::query("INSERT INTO schema_migrations (name) VALUES ($1)")
                .bind(step.name)
                .execute(&mut *conn)
                .await
                .map_err(step_error(step.name))?;

            info!(
                subsystem = "database",
                component = "migrator",
                migration = step.name,
                duration_ms = step_start.elapsed().as_millis() as u64,
                "Applied migration"
            );
            applied.push(step.name);
        }

        Ok(applied)
    }
}

/// List recorded steps in the order they were applied.
pub async fn applied_migrations(pool: &PgPool) -> Result<Vec<AppliedMigration>> {
    sqlx::query_as::<_, AppliedMigration>(
        "SELECT name, applied_at FROM schema_migrations ORDER BY applied_at, name",
    )
    .fetch_all(pool)
    .await
    .map_err(Error::db("failed to list applied migrations"))
}

fn bookkeeping_error(source: sqlx::Error) -> Error {
    Error::Migration {
        step: MIGRATIONS_TABLE.to_string(),
        source,
    }
}

fn step_error(name: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |source| Error::Migration {
        step: name.to_string(),
        source,
    }
}
