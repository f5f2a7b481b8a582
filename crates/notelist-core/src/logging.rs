//! Structured logging schema and field name constants for notelist.
//!
//! All crates use these constants for consistent structured logging fields.
//! This ensures log aggregation tools (Loki, Elasticsearch) can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown, migrations applied) |
//! | DEBUG | Decision points, not-found outcomes, skipped migrations |
//! | TRACE | Per-statement detail |
//!
//! Identity strings from an authorization set are never logged; use
//! [`AUTH_COUNT`] instead.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "database", "migrate"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "migrator", "notes"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "get", "update", "delete", "apply"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Note list id being operated on.
pub const LIST_ID: &str = "list_id";

/// Number of identities presented by the caller.
pub const AUTH_COUNT: &str = "auth_count";

/// Name of a schema migration step.
pub const MIGRATION: &str = "migration";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows affected by a statement.
pub const ROWS_AFFECTED: &str = "rows_affected";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Every field name above, for schema checks.
pub const ALL_FIELDS: &[&str] = &[
    SUBSYSTEM,
    COMPONENT,
    OPERATION,
    NOTE_ID,
    LIST_ID,
    AUTH_COUNT,
    MIGRATION,
    DURATION_MS,
    ROWS_AFFECTED,
    POOL_SIZE,
    POOL_IDLE,
    ERROR_MSG,
];
