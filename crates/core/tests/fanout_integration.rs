//! Fan-out integration: dispatcher + presence registry + notification store.
//!
//! Walks the multi-device scenario end to end over a mocked store: one
//! recipient on two connections, a dispatched notification reaching both, the
//! unread count converging after a read from one session.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use quorum_core::{NewNotification, NotificationDispatcher, NotificationService, PresenceRegistry};
use quorum_db::entities::notification::{self, NotificationKind};
use quorum_db::repositories::NotificationRepository;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use tokio::sync::mpsc;

fn stored_model(id: &str, recipient_id: &str) -> notification::Model {
    notification::Model {
        id: id.to_string(),
        recipient_id: recipient_id.to_string(),
        actor_id: Some("alice".to_string()),
        kind: NotificationKind::Upvote,
        message: "Your question received an upvote".to_string(),
        link: Some("/questions/q1".to_string()),
        is_read: false,
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_two_devices_receive_push_and_read_state_converges() {
    // Statement order over one store: insert the notification, count unread
    // (1), mark-read from one session, count unread again (0).
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[stored_model("n1", "bob")]])
        .append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(1))
        }]])
        .append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(0))
        }]])
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection();

    let notifications = NotificationService::new(NotificationRepository::new(Arc::new(db)));
    let presence = Arc::new(PresenceRegistry::new());
    let dispatcher = NotificationDispatcher::new(notifications.clone(), Arc::clone(&presence));

    // Bob is connected on two devices
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    presence.register("bob", "c1", tx1);
    presence.register("bob", "c2", tx2);

    let stored = dispatcher
        .dispatch(NewNotification {
            recipient_id: "bob".to_string(),
            actor_id: Some("alice".to_string()),
            kind: NotificationKind::Upvote,
            message: "Your question received an upvote".to_string(),
            link: Some("/questions/q1".to_string()),
        })
        .await
        .unwrap();

    // Both connections got the push, payload intact
    let push1 = rx1.try_recv().unwrap();
    let push2 = rx2.try_recv().unwrap();
    assert_eq!(push1.id, stored.id);
    assert_eq!(push2.id, stored.id);
    assert_eq!(push1.kind, "upvote");
    assert_eq!(push1.link.as_deref(), Some("/questions/q1"));

    // One durable record, unread
    assert_eq!(notifications.unread_count("bob").await.unwrap(), 1);

    // Reading from one session settles the state for every session
    assert!(notifications.mark_read("bob", &stored.id).await.unwrap());
    assert_eq!(notifications.unread_count("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn test_offline_dispatch_is_pull_retrievable() {
    // Insert, then the later list: count (1) + page fetch returning the row.
    let stored = stored_model("n1", "bob");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[stored.clone()]])
        .append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(1))
        }]])
        .append_query_results([[stored]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let notifications = NotificationService::new(NotificationRepository::new(Arc::new(db)));
    let presence = Arc::new(PresenceRegistry::new());
    let dispatcher = NotificationDispatcher::new(notifications.clone(), Arc::clone(&presence));

    // Bob has zero live connections; the dispatch must still succeed
    let created = dispatcher
        .dispatch(NewNotification {
            recipient_id: "bob".to_string(),
            actor_id: Some("alice".to_string()),
            kind: NotificationKind::Upvote,
            message: "Your question received an upvote".to_string(),
            link: Some("/questions/q1".to_string()),
        })
        .await
        .unwrap();
    assert!(!created.is_read);

    // Bob reconnects later and polls
    let (items, total) = notifications.list("bob", 0, 20, true).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "n1");
}
