pub mod goal;
pub mod user;

pub use goal::GoalRecord;
pub use user::User;
