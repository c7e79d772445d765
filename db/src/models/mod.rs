pub mod attendance_record;
pub mod session;
pub mod user;
