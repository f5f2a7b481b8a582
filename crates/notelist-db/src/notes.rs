//! Note repository implementation.
//!
//! Every statement carries the caller's identities as a `text[]` parameter
//! and only touches notes whose list has a matching `note_permissions` row.
//! A missing note and a note the caller may not see produce the same error.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, info, warn};

use notelist_core::{AuthorizationSet, Error, NewNote, Note, NoteRepository, Result};

/// Name of the foreign key from `notes.list_id` to `note_lists.id`.
pub const LIST_FK_CONSTRAINT: &str = "fk_list";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, note: NewNote, auths: &AuthorizationSet) -> Result<i32> {
        let start = Instant::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(Error::db("failed to begin transaction"))?;

        let granted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM note_permissions
                WHERE list_id = $1 AND favored = ANY($2::text[])
            )",
        )
        .bind(note.list_id)
        .bind(auths.to_vec())
        .fetch_one(&mut *tx)
        .await;

        match granted {
            Ok(true) => {}
            Ok(false) => {
                rollback(tx).await;
                debug!(
                    subsystem = "database",
                    component = "notes",
                    op = "create",
                    list_id = note.list_id,
                    auth_count = auths.len(),
                    "No matching grant for note-list"
                );
                return Err(Error::NoteListNotFound);
            }
            Err(e) => {
                rollback(tx).await;
                return Err(Error::db("failed to check permissions to insert note")(e));
            }
        }

        let inserted = sqlx::query_scalar::<_, i32>(
            "INSERT INTO notes (name, description, list_id)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&note.name)
        .bind(&note.description)
        .bind(note.list_id)
        .fetch_one(&mut *tx)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                rollback(tx).await;
                return Err(map_insert_error(e));
            }
        };

        tx.commit()
            .await
            .map_err(Error::db("failed to commit insert note transaction"))?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create",
            note_id = id,
            list_id = note.list_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note created"
        );
        Ok(id)
    }

    async fn get(&self, id: i32, auths: &AuthorizationSet) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.id, n.name, n.description, n.list_id
            FROM notes AS n
            WHERE n.id = $1
              AND EXISTS (
                  SELECT 1 FROM note_permissions AS p
                  WHERE p.list_id = n.list_id AND p.favored = ANY($2::text[])
              )
            "#,
        )
        .bind(id)
        .bind(auths.to_vec())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::db("failed to scan note-query result"))?;

        note.ok_or_else(|| {
            debug!(
                subsystem = "database",
                component = "notes",
                op = "get",
                note_id = id,
                auth_count = auths.len(),
                "Note not found"
            );
            Error::NoteNotFound
        })
    }

    async fn update(&self, note: &Note, auths: &AuthorizationSet) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notes SET name = $2, description = $3
            WHERE id = $1
              AND list_id IN (
                  SELECT p.list_id FROM note_permissions AS p
                  WHERE p.favored = ANY($4::text[])
              )
            "#,
        )
        .bind(note.id)
        .bind(&note.name)
        .bind(&note.description)
        .bind(auths.to_vec())
        .execute(&self.pool)
        .await
        .map_err(Error::db("failed to update note"))?;

        require_affected(result.rows_affected(), "update", note.id, auths)
    }

    async fn delete(&self, id: i32, auths: &AuthorizationSet) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM notes
            WHERE id = $1
              AND list_id IN (
                  SELECT p.list_id FROM note_permissions AS p
                  WHERE p.favored = ANY($2::text[])
              )
            "#,
        )
        .bind(id)
        .bind(auths.to_vec())
        .execute(&self.pool)
        .await
        .map_err(Error::db("failed to delete note"))?;

        require_affected(result.rows_affected(), "delete", id, auths)
    }
}

/// Roll back on an error path. A failed rollback is logged, not returned.
async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        warn!(
            subsystem = "database",
            component = "notes",
            error = %e,
            "Failed to roll back transaction"
        );
    }
}

/// A violated `fk_list` means the list vanished between the permission
/// check and the insert; report it like a missing grant.
fn map_insert_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some(LIST_FK_CONSTRAINT) {
            return Error::NoteListNotFound;
        }
    }
    Error::db("failed to insert note")(e)
}

fn require_affected(
    rows_affected: u64,
    op: &'static str,
    note_id: i32,
    auths: &AuthorizationSet,
) -> Result<()> {
    if rows_affected < 1 {
        debug!(
            subsystem = "database",
            component = "notes",
            op,
            note_id,
            auth_count = auths.len(),
            "Note not found"
        );
        return Err(Error::NoteNotFound);
    }

    info!(
        subsystem = "database",
        component = "notes",
        op,
        note_id,
        rows_affected,
        "Note changed"
    );
    Ok(())
}
