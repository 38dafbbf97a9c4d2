pub mod attendance_mark;
pub mod session;
pub mod user;

pub use attendance_mark::Entity as AttendanceMark;
pub use session::Entity as Session;
pub use user::Entity as User;
