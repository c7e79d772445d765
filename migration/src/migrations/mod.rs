pub mod m202509100001_create_users;
pub mod m202509100002_create_sessions;
pub mod m202509100003_create_attendance_records;
