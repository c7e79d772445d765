//! Response DTOs shared across route groups and WebSocket payloads.

use db::models::{attendance_record, session, user};
use serde::Serialize;

#[derive(Debug, Serialize, Default, Clone)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub student_number: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role.to_string(),
            department: u.department,
            student_number: u.student_number,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct SessionResponse {
    pub id: String,
    pub course_name: String,
    pub course_code: String,
    pub faculty_id: String,
    pub faculty_name: String,
    pub department: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub active: bool,
    pub qr_code: String,
    pub total_students: i32,
    pub present_count: i32,
    pub created_at: String,
}

impl From<session::Model> for SessionResponse {
    fn from(s: session::Model) -> Self {
        Self {
            id: s.id,
            course_name: s.course_name,
            course_code: s.course_code,
            faculty_id: s.faculty_id,
            faculty_name: s.faculty_name,
            department: s.department,
            start_time: s.start_time.to_rfc3339(),
            end_time: s.end_time.map(|t| t.to_rfc3339()),
            active: s.active,
            qr_code: s.qr_code,
            total_students: s.total_students,
            present_count: s.present_count,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct AttendanceRecordResponse {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    pub student_name: String,
    pub course_code: String,
    pub marked_at: String,
    pub verification_method: String,
    pub confidence_score: f64,
    pub location: Option<String>,
}

impl From<attendance_record::Model> for AttendanceRecordResponse {
    fn from(r: attendance_record::Model) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            student_id: r.student_id,
            student_name: r.student_name,
            course_code: r.course_code,
            marked_at: r.marked_at.to_rfc3339(),
            verification_method: r.verification_method,
            confidence_score: r.confidence_score,
            location: r.location,
        }
    }
}
