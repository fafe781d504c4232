//! Notification dispatcher.
//!
//! Orchestrates a producer event into durable state plus best-effort live
//! delivery: persist through the notification store first, then push to every
//! connection the presence registry holds for the recipient. A missed push is
//! never an error — the stored row is the source of truth and offline clients
//! converge by pulling.

use std::sync::Arc;

use quorum_common::{AppError, AppResult, get_metrics};
use quorum_db::entities::notification;

use crate::services::notification::{NewNotification, NotificationService};
use crate::services::presence::{PresenceRegistry, PushMessage};

/// Persist-then-push orchestrator.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: NotificationService,
    presence: Arc<PresenceRegistry>,
}

impl NotificationDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub const fn new(notifications: NotificationService, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            notifications,
            presence,
        }
    }

    /// Persist a notification and push it to the recipient's live connections.
    ///
    /// The store write is spawned onto the runtime and awaited through its
    /// handle: a caller cancelled mid-request cannot abandon the insert, and
    /// the single-row statement is all-or-nothing. Store failures propagate;
    /// per-connection push failures are logged and swallowed.
    pub async fn dispatch(&self, input: NewNotification) -> AppResult<notification::Model> {
        let notifications = self.notifications.clone();
        let stored = tokio::spawn(async move { notifications.create(input).await })
            .await
            .map_err(|e| AppError::Internal(format!("notification store task failed: {e}")))??;

        let payload = PushMessage::from(&stored);
        let connections = self.presence.senders_for(&stored.recipient_id);

        if connections.is_empty() {
            tracing::debug!(
                recipient_id = %stored.recipient_id,
                notification_id = %stored.id,
                "Recipient offline, notification stored for pull"
            );
            return Ok(stored);
        }

        for (connection_id, sender) in connections {
            // Fire-and-forget per connection: the unbounded channel never
            // blocks on a slow socket, and one dead connection does not
            // affect the others.
            match sender.send(payload.clone()) {
                Ok(()) => get_metrics().record_push(true),
                Err(_) => {
                    get_metrics().record_push(false);
                    tracing::warn!(
                        connection_id = %connection_id,
                        notification_id = %stored.id,
                        "Push failed, connection closed mid-dispatch"
                    );
                }
            }
        }

        Ok(stored)
    }
}

impl From<&notification::Model> for PushMessage {
    fn from(n: &notification::Model) -> Self {
        Self {
            id: n.id.clone(),
            kind: n.kind.as_str().to_string(),
            message: n.message.clone(),
            link: n.link.clone(),
            actor_id: n.actor_id.clone(),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}
