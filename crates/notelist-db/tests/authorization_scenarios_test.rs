//! End-to-end authorization scenarios through the public API.
//!
//! This test suite validates:
//! - The create / denied read / read / delete / read lifecycle of one note
//! - Creating into a list that does not exist
//! - Read, update and delete succeed exactly when the caller's identities
//!   overlap the list's grants
//!
//! **IMPORTANT**: These tests require a running PostgreSQL. Set `DATABASE_URL`
//! (or a `.env` file) and run with `cargo test -- --ignored`.

use notelist_db::test_fixtures::TestDatabase;
use notelist_db::{AuthorizationSet, Error, NewNote, Note, NoteRepository, PermissionGrant};

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_single_note_lifecycle() {
    let test_db = setup().await;
    let notes = &test_db.db.notes;

    let list_id = test_db.create_list("team list").await;
    assert_eq!(list_id, 1);
    test_db.grant(list_id, "team-a").await;

    let team_a: AuthorizationSet = ["team-a"].into();
    let team_b: AuthorizationSet = ["team-b"].into();

    let id = notes
        .create(NewNote::new("x", "", list_id), &team_a)
        .await
        .expect("create note");
    assert_eq!(id, 1);

    let err = notes.get(id, &team_b).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound));

    let note = notes.get(id, &team_a).await.expect("authorized read");
    assert_eq!(
        note,
        Note {
            id: 1,
            name: "x".to_string(),
            description: "".to_string(),
            list_id: 1,
        }
    );

    notes.delete(id, &team_a).await.expect("authorized delete");

    let err = notes.get(id, &team_a).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_create_into_missing_list() {
    let test_db = setup().await;

    let err = test_db
        .db
        .notes
        .create(NewNote::new("y", "", 999), &["anyone"].into())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoteListNotFound));
    assert!(err.is_not_found());
    assert_eq!(test_db.total_note_count().await, 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_access_iff_identities_overlap_grants() {
    let test_db = setup().await;
    let notes = &test_db.db.notes;

    let list_id = test_db.create_list("guarded").await;
    let grants = vec![
        PermissionGrant {
            list_id,
            favored: "alice".to_string(),
        },
        PermissionGrant {
            list_id,
            favored: "ops".to_string(),
        },
    ];
    for grant in &grants {
        test_db.grant(grant.list_id, &grant.favored).await;
    }
    let owner: AuthorizationSet = ["alice"].into();

    let callers: Vec<AuthorizationSet> = vec![
        AuthorizationSet::new(),
        ["bob"].into(),
        ["alice"].into(),
        ["ops"].into(),
        ["bob", "ops"].into(),
        ["ALICE"].into(),
        ["alice ", "opsx"].into(),
    ];

    for caller in &callers {
        let expected = caller.permits(list_id, &grants);

        let id = notes
            .create(NewNote::new("probe", "before", list_id), &owner)
            .await
            .unwrap();

        let read = notes.get(id, caller).await;
        assert_eq!(read.is_ok(), expected, "get with {caller:?}");
        if !expected {
            assert!(matches!(read, Err(Error::NoteNotFound)));
        }

        let edit = Note {
            id,
            name: "probe".to_string(),
            description: "after".to_string(),
            list_id,
        };
        let updated = notes.update(&edit, caller).await;
        assert_eq!(updated.is_ok(), expected, "update with {caller:?}");
        let stored = notes.get(id, &owner).await.unwrap();
        let want = if expected { "after" } else { "before" };
        assert_eq!(stored.description, want);

        let deleted = notes.delete(id, caller).await;
        assert_eq!(deleted.is_ok(), expected, "delete with {caller:?}");
        if !expected {
            assert!(matches!(deleted, Err(Error::NoteNotFound)));
            notes.delete(id, &owner).await.unwrap();
        }
    }

    assert_eq!(test_db.note_count(list_id).await, 0);
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_deleted_list_rejects_create() {
    let test_db = setup().await;

    let list_id = test_db.create_list("short-lived").await;
    test_db.grant(list_id, "team-a").await;
    test_db.delete_list(list_id).await;

    let err = test_db
        .db
        .notes
        .create(NewNote::new("late", "", list_id), &["team-a"].into())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoteListNotFound));

    test_db.cleanup().await;
}
