//! Error types for notelist.

use thiserror::Error;

/// Result type alias using notelist's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notelist operations.
///
/// The two not-found variants deliberately do not distinguish between a
/// missing row and a row the caller holds no grant for.
#[derive(Error, Debug)]
pub enum Error {
    /// The connection pool could not be established
    #[error("failed to open database connection: {0}")]
    Connect(#[source] sqlx::Error),

    /// The liveness round-trip after connecting failed
    #[error("failed to ping database: {0}")]
    Ping(#[source] sqlx::Error),

    /// A named schema migration step failed
    #[error("failed to execute schema migration {step:?}: {source}")]
    Migration {
        step: String,
        #[source]
        source: sqlx::Error,
    },

    /// No authorized grant for the list, or the list does not exist
    #[error("requested note-list does not exist")]
    NoteListNotFound,

    /// No note with that id among the caller's authorized lists
    #[error("requested note does not exist")]
    NoteNotFound,

    /// Any other store failure, prefixed with the failing operation
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns a closure wrapping a `sqlx::Error` with operation context,
    /// for use with `map_err`.
    pub fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
        move |source| Error::Database { context, source }
    }

    /// True for the two not-found kinds, which callers render as
    /// "nothing to show" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoteListNotFound | Error::NoteNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_note_not_found() {
        let err = Error::NoteNotFound;
        assert_eq!(err.to_string(), "requested note does not exist");
    }

    #[test]
    fn test_error_display_note_list_not_found() {
        let err = Error::NoteListNotFound;
        assert_eq!(err.to_string(), "requested note-list does not exist");
    }

    #[test]
    fn test_error_display_database_has_context() {
        let err = Error::db("failed to insert note")(sqlx::Error::RowNotFound);
        let msg = err.to_string();
        assert!(msg.starts_with("failed to insert note: "));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display_migration_names_step() {
        let err = Error::Migration {
            step: "Setup note-lists".to_string(),
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().contains("\"Setup note-lists\""));
    }

    #[test]
    fn test_error_display_connect_and_ping() {
        let err = Error::Connect(sqlx::Error::PoolTimedOut);
        assert!(err
            .to_string()
            .starts_with("failed to open database connection"));

        let err = Error::Ping(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("failed to ping database"));
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DATABASE_MAX_CONNECTIONS must be a number".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: DATABASE_MAX_CONNECTIONS must be a number"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NoteNotFound.is_not_found());
        assert!(Error::NoteListNotFound.is_not_found());
        assert!(!Error::Config("x".to_string()).is_not_found());
        assert!(!Error::Ping(sqlx::Error::PoolClosed).is_not_found());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = Error::db("failed to delete note")(sqlx::Error::PoolTimedOut);
        assert!(err.source().is_some());
        assert!(Error::NoteNotFound.source().is_none());
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::NoteNotFound);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
