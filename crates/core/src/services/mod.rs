//! Business logic services.

#![allow(missing_docs)]

pub mod dispatcher;
pub mod notification;
pub mod presence;
pub mod score;
pub mod targets;
pub mod vote;

pub use dispatcher::NotificationDispatcher;
pub use notification::{NewNotification, NotificationService};
pub use presence::{PresenceRegistry, PushMessage, PushSender};
pub use score::{ScoreProjector, TargetScore};
pub use targets::TargetDirectory;
pub use vote::{Direction, ScoreResult, VoteService};
