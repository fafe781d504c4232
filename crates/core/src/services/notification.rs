//! Notification store service.
//!
//! Durable per-recipient notification records with read/unread state. Live
//! delivery is the dispatcher's job; offline recipients converge by pulling
//! through this service.

use chrono::Utc;
use quorum_common::{AppResult, IdGenerator, get_metrics};
use quorum_db::{
    entities::notification::{self, NotificationKind},
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Input for creating a notification.
///
/// Producers resolve message, link, and actor before handing it over; the
/// store only assigns identity, timestamp, and the unread state.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    pub actor_id: Option<String>,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Persist a notification. Assigns id and created_at; starts unread.
    pub async fn create(&self, input: NewNotification) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(input.recipient_id),
            actor_id: Set(input.actor_id),
            kind: Set(input.kind),
            message: Set(input.message),
            link: Set(input.link),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;
        get_metrics().record_notification_created();
        Ok(created)
    }

    /// One page of a user's notifications plus the total count.
    pub async fn list(
        &self,
        recipient_id: &str,
        page: u64,
        page_size: u64,
        unread_only: bool,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        self.notification_repo
            .find_page(recipient_id, page, page_size, unread_only)
            .await
    }

    /// Mark one notification as read.
    ///
    /// False when the id is absent or owned by someone else; the ownership
    /// check rides in the update statement itself.
    pub async fn mark_read(&self, recipient_id: &str, notification_id: &str) -> AppResult<bool> {
        self.notification_repo
            .mark_read(notification_id, recipient_id)
            .await
    }

    /// Mark all currently-unread notifications as read.
    ///
    /// Point-in-time bulk transition: rows dispatched after the statement
    /// begins stay unread.
    pub async fn mark_all_read(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_read(recipient_id).await
    }

    /// Count unread notifications for a user.
    pub async fn unread_count(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(recipient_id).await
    }

    /// Delete one notification (ownership checked in the statement).
    pub async fn delete(&self, recipient_id: &str, notification_id: &str) -> AppResult<bool> {
        self.notification_repo
            .delete(notification_id, recipient_id)
            .await
    }

    /// Delete all notifications for a user.
    pub async fn delete_all(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.delete_all_for_user(recipient_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> NotificationService {
        NotificationService::new(NotificationRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_mark_read_rejects_foreign_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let updated = service(db).mark_read("intruder", "n1").await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_mark_all_read_then_unread_count_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }]])
            .into_connection();

        let service = service(db);
        let flipped = service.mark_all_read("user1").await.unwrap();
        assert_eq!(flipped, 2);

        let unread = service.unread_count("user1").await.unwrap();
        assert_eq!(unread, 0);
    }

    #[tokio::test]
    async fn test_list_passes_through_page_and_total() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }]])
            .append_query_results([Vec::<notification::Model>::new()])
            .into_connection();

        let (items, total) = service(db).list("user1", 0, 20, true).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }
}
