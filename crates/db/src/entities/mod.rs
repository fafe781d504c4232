//! SeaORM entities.

pub mod answer;
pub mod notification;
pub mod question;
pub mod user;
pub mod vote;

pub use answer::Entity as Answer;
pub use notification::Entity as Notification;
pub use question::Entity as Question;
pub use user::Entity as User;
pub use vote::Entity as Vote;
