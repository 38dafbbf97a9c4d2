pub mod m202510180001_create_users;
pub mod m202510180002_create_sessions;
pub mod m202510180003_create_attendance_marks;
pub mod m202510180004_add_user_password_hash;
