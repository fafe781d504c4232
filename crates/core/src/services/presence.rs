//! Presence registry.
//!
//! Tracks which live connections belong to which authenticated user. A user
//! may hold any number of simultaneous connections (tabs, devices); zero
//! connections is the normal offline representation. One explicitly-owned
//! instance lives for the whole process and is shared by the dispatcher and
//! the streaming transport.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;

/// Payload pushed to live connections; the transport forwards it verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub link: Option<String>,
    pub actor_id: Option<String>,
    pub created_at: String,
}

/// Sending half of a connection's push channel.
///
/// Unbounded: a send never blocks the dispatcher on a slow socket; the
/// connection's writer task owns the draining.
pub type PushSender = mpsc::UnboundedSender<PushMessage>;

struct Connection {
    connected_at: DateTime<Utc>,
    sender: PushSender,
}

#[derive(Default)]
struct RegistryInner {
    /// user_id → connection_id → connection
    by_user: HashMap<String, HashMap<String, Connection>>,
    /// connection_id → owning user_id
    by_connection: HashMap<String, String>,
}

/// Drop a connection from a user's set, and the user entry when it empties.
fn remove_connection(
    by_user: &mut HashMap<String, HashMap<String, Connection>>,
    user_id: &str,
    connection_id: &str,
) {
    let became_empty = by_user.get_mut(user_id).is_some_and(|connections| {
        connections.remove(connection_id);
        connections.is_empty()
    });

    if became_empty {
        by_user.remove(user_id);
    }
}

/// In-process connection registry.
#[derive(Default)]
pub struct PresenceRegistry {
    inner: RwLock<RegistryInner>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection for a user.
    ///
    /// Re-registering an id that is still tracked replaces the old handle
    /// (the stale sender is dropped, failing any in-flight push to it).
    pub fn register(&self, user_id: &str, connection_id: &str, sender: PushSender) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous_owner) = inner.by_connection.get(connection_id).cloned() {
            remove_connection(&mut inner.by_user, &previous_owner, connection_id);
        }

        inner
            .by_connection
            .insert(connection_id.to_string(), user_id.to_string());
        inner
            .by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(
                connection_id.to_string(),
                Connection {
                    connected_at: Utc::now(),
                    sender,
                },
            );

        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Connection registered");
    }

    /// Remove a connection, returning the owning user if it was tracked.
    ///
    /// Drops the user's entry entirely when their last connection goes away.
    pub fn unregister(&self, connection_id: &str) -> Option<String> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let user_id = inner.by_connection.remove(connection_id)?;
        remove_connection(&mut inner.by_user, &user_id, connection_id);

        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Connection unregistered");
        Some(user_id)
    }

    /// Ids of a user's live connections; empty when offline.
    #[must_use]
    pub fn connections_for(&self, user_id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_user
            .get(user_id)
            .map(|connections| connections.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Push handles for a user's live connections.
    ///
    /// Senders are cloned out so the lock is released before any send.
    #[must_use]
    pub fn senders_for(&self, user_id: &str) -> Vec<(String, PushSender)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_user
            .get(user_id)
            .map(|connections| {
                connections
                    .iter()
                    .map(|(id, conn)| (id.clone(), conn.sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// When a connection was opened, if it is still tracked.
    #[must_use]
    pub fn connected_at(&self, connection_id: &str) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let user_id = inner.by_connection.get(connection_id)?;
        inner
            .by_user
            .get(user_id)?
            .get(connection_id)
            .map(|conn| conn.connected_at)
    }

    /// Whether the user has at least one live connection.
    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_user.contains_key(user_id)
    }

    /// Total tracked connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_connection.len()
    }

    /// Distinct users with at least one connection.
    #[must_use]
    pub fn user_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_user.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn channel() -> (PushSender, mpsc::UnboundedReceiver<PushMessage>) {
        mpsc::unbounded_channel()
    }

    fn test_message(id: &str) -> PushMessage {
        PushMessage {
            id: id.to_string(),
            kind: "upvote".to_string(),
            message: "Your question received an upvote".to_string(),
            link: Some("/questions/q1".to_string()),
            actor_id: Some("actor1".to_string()),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_offline_user_has_empty_set() {
        let registry = PresenceRegistry::new();
        assert!(registry.connections_for("ghost").is_empty());
        assert!(!registry.is_online("ghost"));
    }

    #[test]
    fn test_register_multiple_connections_per_user() {
        let registry = PresenceRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        registry.register("user1", "c1", tx1);
        registry.register("user1", "c2", tx2);

        let mut connections = registry.connections_for("user1");
        connections.sort();
        assert_eq!(connections, vec!["c1".to_string(), "c2".to_string()]);
        assert_eq!(registry.connection_count(), 2);
        assert_eq!(registry.user_count(), 1);
    }

    #[test]
    fn test_unregister_drops_empty_user_entry() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = channel();

        registry.register("user1", "c1", tx);
        assert!(registry.is_online("user1"));

        let owner = registry.unregister("c1");
        assert_eq!(owner.as_deref(), Some("user1"));
        assert!(!registry.is_online("user1"));
        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn test_unregister_unknown_connection_is_none() {
        let registry = PresenceRegistry::new();
        assert!(registry.unregister("never-registered").is_none());
    }

    #[test]
    fn test_connected_at_tracked_while_live() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = channel();

        registry.register("user1", "c1", tx);
        assert!(registry.connected_at("c1").is_some());

        registry.unregister("c1");
        assert!(registry.connected_at("c1").is_none());
    }

    #[test]
    fn test_senders_reach_every_connection() {
        let registry = PresenceRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();

        registry.register("user1", "c1", tx1);
        registry.register("user1", "c2", tx2);

        for (_, sender) in registry.senders_for("user1") {
            sender.send(test_message("n1")).unwrap();
        }

        assert_eq!(rx1.try_recv().unwrap().id, "n1");
        assert_eq!(rx2.try_recv().unwrap().id, "n1");
    }

    #[test]
    fn test_reregister_replaces_stale_handle() {
        let registry = PresenceRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, mut rx2) = channel();

        registry.register("user1", "c1", tx1);
        registry.register("user1", "c1", tx2);

        assert_eq!(registry.connection_count(), 1);
        for (_, sender) in registry.senders_for("user1") {
            sender.send(test_message("n1")).unwrap();
        }
        assert_eq!(rx2.try_recv().unwrap().id, "n1");
    }
}
