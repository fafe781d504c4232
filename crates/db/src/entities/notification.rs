//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    #[sea_orm(string_value = "answerPosted")]
    AnswerPosted,
    #[sea_orm(string_value = "answerAccepted")]
    AnswerAccepted,
    #[sea_orm(string_value = "commentReceived")]
    CommentReceived,
    #[sea_orm(string_value = "upvote")]
    Upvote,
    #[sea_orm(string_value = "downvote")]
    Downvote,
    #[sea_orm(string_value = "mention")]
    Mention,
}

impl NotificationKind {
    /// Wire name used in push payloads and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnswerPosted => "answerPosted",
            Self::AnswerAccepted => "answerAccepted",
            Self::CommentReceived => "commentReceived",
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
            Self::Mention => "mention",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub recipient_id: String,

    /// The user whose action triggered it (absent for system notifications)
    #[sea_orm(nullable)]
    pub actor_id: Option<String>,

    /// Notification type
    pub kind: NotificationKind,

    /// Human-readable text, resolved by the producer at dispatch time
    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// Relative link to the triggering content
    #[sea_orm(nullable)]
    pub link: Option<String>,

    /// Has this notification been read?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl ActiveModelBehavior for ActiveModel {}
