//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `quorum_test`)
//!   `TEST_DB_PASSWORD` (default: `quorum_test`)
//!   `TEST_DB_NAME` (default: `quorum_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use quorum_db::entities::{question, user, vote, vote::TargetKind};
use quorum_db::repositories::{QuestionRepository, VoteInsert, VoteRepository};
use quorum_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;
use sea_orm_migration::MigratorTrait;

async fn setup() -> TestDatabase {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    quorum_db::migrations::Migrator::up(db.connection(), None)
        .await
        .expect("Migrations failed");
    db
}

async fn seed_user(db: &TestDatabase, id: &str) {
    use sea_orm::ActiveModelTrait;
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("user_{id}")),
        display_name: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.connection())
    .await
    .unwrap();
}

async fn seed_question(db: &TestDatabase, id: &str, author_id: &str) {
    let repo = QuestionRepository::new(db.shared());
    repo.create(question::ActiveModel {
        id: Set(id.to_string()),
        author_id: Set(author_id.to_string()),
        title: Set("title".to_string()),
        body: Set("body".to_string()),
        created_at: Set(Utc::now().into()),
    })
    .await
    .unwrap();
}

fn vote_model(id: &str, user_id: &str, target_id: &str, is_upvote: bool) -> vote::ActiveModel {
    vote::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        target_kind: Set(TargetKind::Question),
        target_id: Set(target_id.to_string()),
        is_upvote: Set(is_upvote),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_vote_insert_reports_conflict() {
    let db = setup().await;
    seed_user(&db, "u1").await;
    seed_question(&db, "q1", "u1").await;

    let repo = VoteRepository::new(db.shared());

    let first = repo.try_insert(vote_model("v1", "u1", "q1", true)).await.unwrap();
    assert!(matches!(first, VoteInsert::Inserted(_)));

    // Same (user, target) tuple, different row id: the unique index rejects it
    let second = repo.try_insert(vote_model("v2", "u1", "q1", false)).await.unwrap();
    assert!(matches!(second, VoteInsert::Conflict));

    // The conflict fallback flips the surviving row in place
    let rows = repo
        .set_direction("u1", TargetKind::Question, "q1", false)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let current = repo
        .find_by_user_and_target("u1", TargetKind::Question, "q1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.id, "v1");
    assert!(!current.is_upvote);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_tally_reflects_all_voters() {
    let db = setup().await;
    seed_user(&db, "u1").await;
    seed_user(&db, "u2").await;
    seed_user(&db, "u3").await;
    seed_question(&db, "q1", "u1").await;

    let repo = VoteRepository::new(db.shared());
    repo.try_insert(vote_model("v1", "u1", "q1", true)).await.unwrap();
    repo.try_insert(vote_model("v2", "u2", "q1", true)).await.unwrap();
    repo.try_insert(vote_model("v3", "u3", "q1", false)).await.unwrap();

    let (up, down) = repo.tally(TargetKind::Question, "q1").await.unwrap();
    assert_eq!(up, 2);
    assert_eq!(down, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_remove_then_tally_is_clean() {
    let db = setup().await;
    seed_user(&db, "u1").await;
    seed_question(&db, "q1", "u1").await;

    let repo = VoteRepository::new(db.shared());
    repo.try_insert(vote_model("v1", "u1", "q1", true)).await.unwrap();

    let removed = repo
        .delete_by_user_and_target("u1", TargetKind::Question, "q1")
        .await
        .unwrap();
    assert_eq!(removed, 1);

    // Removing again is a no-op, not an error
    let removed_again = repo
        .delete_by_user_and_target("u1", TargetKind::Question, "q1")
        .await
        .unwrap();
    assert_eq!(removed_again, 0);

    let (up, down) = repo.tally(TargetKind::Question, "q1").await.unwrap();
    assert_eq!((up, down), (0, 0));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
}
