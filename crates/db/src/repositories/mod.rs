//! Database repositories.

pub mod answer;
pub mod notification;
pub mod question;
pub mod vote;

pub use answer::AnswerRepository;
pub use notification::NotificationRepository;
pub use question::QuestionRepository;
pub use vote::{VoteInsert, VoteRepository};
