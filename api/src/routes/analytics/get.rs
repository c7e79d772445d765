use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use db::models::{
    attendance_record::{self, Model as RecordModel},
    session,
    user::{self, Role},
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use util::state::AppState;

use crate::ai::{self, SessionStat};
use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::AttendanceRecordResponse;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn db_error(e: DbErr) -> (StatusCode, Json<ApiResponse<Value>>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(format!("Database error: {e}"))),
    )
}

/// GET /analytics/overview
///
/// Role-shaped summary:
/// - student: ended sessions in their department, attended count, rate,
///   10 most recent records;
/// - faculty: own session totals, active/completed split, average
///   attendance rate over ended sessions with a known head count;
/// - admin: system-wide counts.
pub async fn overview(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> (StatusCode, Json<ApiResponse<Value>>) {
    let db = state.db();

    let result = match user.role {
        Role::Student => student_overview(db, &user).await,
        Role::Faculty => faculty_overview(db, &user).await,
        Role::Admin => admin_overview(db).await,
    };

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse::success(data, "Analytics fetched")),
        ),
        Err(e) => db_error(e),
    }
}

async fn student_overview(db: &DatabaseConnection, user: &user::Model) -> Result<Value, DbErr> {
    let department = user.department.as_deref().unwrap_or("");

    let total_sessions = session::Entity::find()
        .filter(session::Column::Department.eq(department))
        .filter(session::Column::Active.eq(false))
        .count(db)
        .await?;

    let attended = attendance_record::Entity::find()
        .filter(attendance_record::Column::StudentId.eq(user.id.as_str()))
        .count(db)
        .await?;

    let attendance_rate = if total_sessions > 0 {
        attended as f64 / total_sessions as f64 * 100.0
    } else {
        0.0
    };

    let recent: Vec<AttendanceRecordResponse> = RecordModel::list_for_student(db, &user.id)
        .await?
        .into_iter()
        .take(10)
        .map(AttendanceRecordResponse::from)
        .collect();

    Ok(json!({
        "total_sessions": total_sessions,
        "attended_sessions": attended,
        "attendance_rate": round2(attendance_rate),
        "recent_attendance": recent,
    }))
}

async fn faculty_overview(db: &DatabaseConnection, user: &user::Model) -> Result<Value, DbErr> {
    let total_sessions = session::Entity::find()
        .filter(session::Column::FacultyId.eq(user.id.as_str()))
        .count(db)
        .await?;

    let active_sessions = session::Entity::find()
        .filter(session::Column::FacultyId.eq(user.id.as_str()))
        .filter(session::Column::Active.eq(true))
        .count(db)
        .await?;

    let ended = session::Entity::find()
        .filter(session::Column::FacultyId.eq(user.id.as_str()))
        .filter(session::Column::Active.eq(false))
        .all(db)
        .await?;

    let mut rates = Vec::new();
    for s in &ended {
        if s.total_students > 0 {
            let count = attendance_record::Entity::find()
                .filter(attendance_record::Column::SessionId.eq(s.id.as_str()))
                .count(db)
                .await?;
            rates.push(count as f64 / s.total_students as f64 * 100.0);
        }
    }
    let average_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    Ok(json!({
        "total_sessions": total_sessions,
        "active_sessions": active_sessions,
        "completed_sessions": total_sessions - active_sessions,
        "average_attendance_rate": round2(average_rate),
    }))
}

async fn admin_overview(db: &DatabaseConnection) -> Result<Value, DbErr> {
    let total_users = user::Entity::find().count(db).await?;
    let total_students = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Student))
        .count(db)
        .await?;
    let total_faculty = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Faculty))
        .count(db)
        .await?;
    let total_sessions = session::Entity::find().count(db).await?;
    let total_attendance = attendance_record::Entity::find().count(db).await?;

    Ok(json!({
        "total_users": total_users,
        "total_students": total_students,
        "total_faculty": total_faculty,
        "total_sessions": total_sessions,
        "total_attendance_records": total_attendance,
    }))
}

/// GET /analytics/trends
///
/// Marks from the last 7 days grouped by calendar date, scoped like the
/// overview (student: own marks; faculty: marks on own sessions; admin:
/// everything).
pub async fn trends(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> (StatusCode, Json<ApiResponse<Value>>) {
    let db = state.db();

    let records = match scoped_records(db, &user).await {
        Ok(records) => records,
        Err(e) => return db_error(e),
    };

    let cutoff = Utc::now() - Duration::days(7);
    let mut daily_counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        if record.marked_at >= cutoff {
            let key = record.marked_at.format("%Y-%m-%d").to_string();
            *daily_counts.entry(key).or_insert(0) += 1;
        }
    }

    let trends: Vec<Value> = daily_counts
        .into_iter()
        .map(|(date, count)| json!({ "date": date, "count": count }))
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            json!({ "trends": trends }),
            "Trends fetched",
        )),
    )
}

async fn scoped_records(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Vec<attendance_record::Model>, DbErr> {
    match user.role {
        Role::Student => RecordModel::list_for_student(db, &user.id).await,
        Role::Faculty => {
            let session_ids: Vec<String> = session::Entity::find()
                .filter(session::Column::FacultyId.eq(user.id.as_str()))
                .all(db)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();
            attendance_record::Entity::find()
                .filter(attendance_record::Column::SessionId.is_in(session_ids))
                .all(db)
                .await
        }
        Role::Admin => attendance_record::Entity::find().all(db).await,
    }
}

/// GET /analytics/ai-insights
///
/// LLM-generated commentary over up to 50 sessions. Faculty and admin
/// only. Upstream failures degrade to a fallback string; this endpoint
/// never fails because of the AI service.
pub async fn ai_insights(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> (StatusCode, Json<ApiResponse<Value>>) {
    if user.role == Role::Student {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not authorized")),
        );
    }

    let db = state.db();
    let sessions = match session::Entity::find().limit(50).all(db).await {
        Ok(sessions) => sessions,
        Err(e) => return db_error(e),
    };

    let mut stats = Vec::with_capacity(sessions.len());
    for s in &sessions {
        let count = match attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(s.id.as_str()))
            .count(db)
            .await
        {
            Ok(count) => count,
            Err(e) => return db_error(e),
        };
        let rate = if s.total_students > 0 {
            count as f64 / s.total_students as f64 * 100.0
        } else {
            0.0
        };
        stats.push(SessionStat {
            session_id: s.id.clone(),
            course_code: s.course_code.clone(),
            attendance_count: count,
            attendance_rate: rate,
        });
    }

    let insights = ai::attendance_insights(&stats).await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            json!({ "insights": insights }),
            "Insights fetched",
        )),
    )
}
