pub mod activity;
pub mod user;

pub use activity::{AdminActivity, NewActivity, TargetType};
pub use user::{AdminUser, AdminUserRow};
