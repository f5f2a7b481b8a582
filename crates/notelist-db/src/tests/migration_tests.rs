//! Tests for the schema migrator against a live PostgreSQL.
//!
//! Covers: idempotent reruns, step bookkeeping, failure reporting by step
//! name, and concurrent startups applying each step once.

use crate::migrations::{applied_migrations, Migration, Migrator, MIGRATIONS};
use crate::test_fixtures::TestDatabase;
use crate::Error;

async fn table_count(test_db: &TestDatabase, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = $1 AND table_name = $2",
    )
    .bind(test_db.schema_name())
    .bind(table)
    .fetch_one(test_db.pool())
    .await
    .expect("count tables")
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_open_creates_schema() {
    let test_db = TestDatabase::new().await;

    for table in ["note_lists", "notes", "note_permissions", "schema_migrations"] {
        assert_eq!(table_count(&test_db, table).await, 1, "{table} missing");
    }

    let applied = applied_migrations(test_db.pool()).await.unwrap();
    let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
    let shipped: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
    assert_eq!(names, shipped);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_second_run_is_noop() {
    let test_db = TestDatabase::new().await;
    let before = applied_migrations(test_db.pool()).await.unwrap();

    let applied = Migrator::default().apply(test_db.pool()).await.unwrap();
    assert!(applied.is_empty(), "rerun applied {applied:?}");

    let after = applied_migrations(test_db.pool()).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(table_count(&test_db, "notes").await, 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_failed_step_is_named_and_earlier_steps_stay_recorded() {
    let test_db = TestDatabase::new().await;

    let migrator = Migrator::new(vec![
        Migration {
            name: "Create probe table",
            sql: "CREATE TABLE probe (id INTEGER)",
        },
        Migration {
            name: "Broken step",
            sql: "SELEC nonsense",
        },
        Migration {
            name: "Never reached",
            sql: "CREATE TABLE never_reached (id INTEGER)",
        },
    ])
    .unwrap();

    match migrator.apply(test_db.pool()).await {
        Err(Error::Migration { step, .. }) => assert_eq!(step, "Broken step"),
        other => panic!("Expected migration error, got {other:?}"),
    }

    let names: Vec<String> = applied_migrations(test_db.pool())
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert!(names.contains(&"Create probe table".to_string()));
    assert!(!names.contains(&"Broken step".to_string()));
    assert!(!names.contains(&"Never reached".to_string()));
    assert_eq!(table_count(&test_db, "probe").await, 1);
    assert_eq!(table_count(&test_db, "never_reached").await, 0);

    // A later run resumes after the recorded step.
    let fixed = Migrator::new(vec![
        Migration {
            name: "Create probe table",
            sql: "CREATE TABLE probe (id INTEGER)",
        },
        Migration {
            name: "Never reached",
            sql: "CREATE TABLE never_reached (id INTEGER)",
        },
    ])
    .unwrap();
    let applied = fixed.apply(test_db.pool()).await.unwrap();
    assert_eq!(applied, vec!["Never reached"]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_multi_statement_step() {
    let test_db = TestDatabase::new().await;

    let migrator = Migrator::new(vec![Migration {
        name: "Seed default list",
        sql: "INSERT INTO note_lists (name, description) VALUES ('inbox', 'default');
              INSERT INTO note_permissions (list_id, favored)
                  SELECT id, 'owner' FROM note_lists WHERE name = 'inbox';",
    }])
    .unwrap();
    migrator.apply(test_db.pool()).await.unwrap();

    let grants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM note_permissions")
        .fetch_one(test_db.pool())
        .await
        .unwrap();
    assert_eq!(grants, 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_concurrent_runs_apply_each_step_once() {
    let test_db = TestDatabase::new().await;

    // Fails if executed twice.
    let migrator = Migrator::new(vec![Migration {
        name: "Create once-only table",
        sql: "CREATE TABLE once_only (id INTEGER)",
    }])
    .unwrap();

    let (a, b) = tokio::join!(
        migrator.apply(test_db.pool()),
        migrator.apply(test_db.pool())
    );
    let total = a.unwrap().len() + b.unwrap().len();
    assert_eq!(total, 1);
    assert_eq!(table_count(&test_db, "once_only").await, 1);

    test_db.cleanup().await;
}
