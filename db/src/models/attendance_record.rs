use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{session, user};

/// One student's presence in one session, in `attendance_records`.
///
/// The table carries a unique index on `(session_id, student_id)`; that
/// index is what guarantees at most one record per student per session
/// even under concurrent marking.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    /// Denormalized at mark time for live-feed payloads.
    pub student_name: String,
    pub course_code: String,
    pub marked_at: DateTime<Utc>,
    /// `face`, `qr`, or `manual`.
    pub verification_method: String,
    pub confidence_score: f64,
    pub location: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Why a mark attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum MarkError {
    #[error("session not found")]
    SessionNotFound,
    #[error("session is no longer active")]
    SessionInactive,
    #[error("attendance already marked for this session")]
    AlreadyMarked,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    /// Record `student` as present in `session_id` and bring the
    /// session's `present_count` up to date, atomically.
    ///
    /// The insert and the count recompute share one transaction; a
    /// concurrent duplicate loses on the unique index and maps to
    /// [`MarkError::AlreadyMarked`].
    pub async fn mark(
        db: &DatabaseConnection,
        session_id: &str,
        student: &user::Model,
        verification_method: &str,
        confidence_score: f64,
        location: Option<&str>,
    ) -> Result<(Self, session::Model), MarkError> {
        let txn = db.begin().await?;

        let session = session::Entity::find_by_id(session_id)
            .one(&txn)
            .await?
            .ok_or(MarkError::SessionNotFound)?;
        if !session.active {
            return Err(MarkError::SessionInactive);
        }

        let record = ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            session_id: Set(session.id.clone()),
            student_id: Set(student.id.clone()),
            student_name: Set(student.name.clone()),
            course_code: Set(session.course_code.clone()),
            marked_at: Set(Utc::now()),
            verification_method: Set(verification_method.to_string()),
            confidence_score: Set(confidence_score),
            location: Set(location.map(str::to_string)),
        };

        let record = match record.insert(&txn).await {
            Ok(record) => record,
            Err(e) if is_duplicate_mark(&e) => return Err(MarkError::AlreadyMarked),
            Err(e) => return Err(e.into()),
        };

        let present = Entity::find()
            .filter(Column::SessionId.eq(session.id.as_str()))
            .count(&txn)
            .await?;

        let mut am: session::ActiveModel = session.into();
        am.present_count = Set(present as i32);
        let session = am.update(&txn).await?;

        txn.commit().await?;
        tracing::debug!(
            session_id = %record.session_id,
            student_id = %record.student_id,
            present_count = session.present_count,
            "attendance recorded"
        );
        Ok((record, session))
    }

    pub async fn exists(
        db: &DatabaseConnection,
        session_id: &str,
        student_id: &str,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::StudentId.eq(student_id))
            .count(db)
            .await?
            > 0)
    }

    /// All marks for a session, newest first.
    pub async fn list_for_session(
        db: &DatabaseConnection,
        session_id: &str,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::MarkedAt)
            .all(db)
            .await
    }

    /// All marks by a student, newest first.
    pub async fn list_for_student(
        db: &DatabaseConnection,
        student_id: &str,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::MarkedAt)
            .all(db)
            .await
    }
}

fn is_duplicate_mark(err: &DbErr) -> bool {
    err.to_string()
        .contains("UNIQUE constraint failed: attendance_records.session_id")
}
