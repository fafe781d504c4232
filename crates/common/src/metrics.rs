//! Metrics collection for quorum.
//!
//! Provides application-level counters for monitoring the vote ledger and the
//! notification fan-out path.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug)]
pub struct Metrics {
    // === Vote Ledger Metrics ===
    /// Votes cast (inserts and flips; idempotent re-casts included)
    pub votes_cast: AtomicU64,
    /// Votes removed
    pub votes_removed: AtomicU64,
    /// Vote upserts that fell back to the conflict path
    pub vote_insert_conflicts: AtomicU64,

    // === Notification Metrics ===
    /// Notifications persisted
    pub notifications_created: AtomicU64,
    /// Live pushes delivered into a connection channel
    pub pushes_sent: AtomicU64,
    /// Live pushes that failed (connection gone mid-dispatch)
    pub pushes_failed: AtomicU64,

    // === Real-time Metrics ===
    /// Active WebSocket connections
    pub websocket_connections_active: AtomicU64,
    /// Total WebSocket messages written to sockets
    pub websocket_messages_sent: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            votes_cast: AtomicU64::new(0),
            votes_removed: AtomicU64::new(0),
            vote_insert_conflicts: AtomicU64::new(0),

            notifications_created: AtomicU64::new(0),
            pushes_sent: AtomicU64::new(0),
            pushes_failed: AtomicU64::new(0),

            websocket_connections_active: AtomicU64::new(0),
            websocket_messages_sent: AtomicU64::new(0),
        }
    }

    /// Record a cast vote.
    pub fn record_vote_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed vote.
    pub fn record_vote_removed(&self) {
        self.votes_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an insert that lost the race and took the conflict path.
    pub fn record_vote_insert_conflict(&self) {
        self.vote_insert_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a persisted notification.
    pub fn record_notification_created(&self) {
        self.notifications_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a per-connection push attempt.
    pub fn record_push(&self, success: bool) {
        if success {
            self.pushes_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pushes_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Start tracking a WebSocket connection.
    pub fn connection_opened(&self) {
        self.websocket_connections_active
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Stop tracking a WebSocket connection.
    pub fn connection_closed(&self) {
        self.websocket_connections_active
            .fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a message written to a socket.
    pub fn record_websocket_message(&self) {
        self.websocket_messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            votes_removed: self.votes_removed.load(Ordering::Relaxed),
            vote_insert_conflicts: self.vote_insert_conflicts.load(Ordering::Relaxed),

            notifications_created: self.notifications_created.load(Ordering::Relaxed),
            pushes_sent: self.pushes_sent.load(Ordering::Relaxed),
            pushes_failed: self.pushes_failed.load(Ordering::Relaxed),

            websocket_connections_active: self
                .websocket_connections_active
                .load(Ordering::Relaxed),
            websocket_messages_sent: self.websocket_messages_sent.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub votes_cast: u64,
    pub votes_removed: u64,
    pub vote_insert_conflicts: u64,

    pub notifications_created: u64,
    pub pushes_sent: u64,
    pub pushes_failed: u64,

    pub websocket_connections_active: u64,
    pub websocket_messages_sent: u64,
}
