use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::user::{self, Role};

/// A class attendance session in the `sessions` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub course_name: String,
    pub course_code: String,
    /// Owning faculty member.
    pub faculty_id: String,
    /// Denormalized at creation so listings don't need a join.
    pub faculty_name: String,
    pub department: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub active: bool,
    /// Join token shown to students in the room.
    pub qr_code: String,
    /// Expected head count, if known. Informational only.
    pub total_students: i32,
    /// Number of distinct students marked present. Recomputed from
    /// `attendance_records` inside the mark transaction, never incremented
    /// in place.
    pub present_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FacultyId",
        to = "super::user::Column::Id"
    )]
    Faculty,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Start a new active session owned by `faculty`.
    pub async fn create(
        db: &DatabaseConnection,
        faculty: &user::Model,
        course_name: &str,
        course_code: &str,
        department: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let session = ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            course_name: Set(course_name.to_string()),
            course_code: Set(course_code.to_string()),
            faculty_id: Set(faculty.id.clone()),
            faculty_name: Set(faculty.name.clone()),
            department: Set(department.to_string()),
            start_time: Set(now),
            end_time: Set(None),
            active: Set(true),
            qr_code: Set(Uuid::new_v4().to_string()),
            total_students: Set(0),
            present_count: Set(0),
            created_at: Set(now),
        };

        session.insert(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Close this session. Ending an already-ended session is a no-op;
    /// the returned flag tells the caller whether anything changed (and
    /// so whether a `session_ended` event should go out).
    pub async fn end(self, db: &DatabaseConnection) -> Result<(Self, bool), DbErr> {
        if !self.active {
            return Ok((self, false));
        }

        let mut am: ActiveModel = self.into();
        am.active = Set(false);
        am.end_time = Set(Some(Utc::now()));
        let updated = am.update(db).await?;
        Ok((updated, true))
    }

    /// Sessions visible to `user`, newest `start_time` first. Faculty see
    /// their own, students see their department's, admins see everything.
    pub async fn list_for(
        db: &DatabaseConnection,
        user: &user::Model,
    ) -> Result<Vec<Self>, DbErr> {
        let query = Entity::find().order_by_desc(Column::StartTime);

        let query = match user.role {
            Role::Faculty => query.filter(Column::FacultyId.eq(user.id.as_str())),
            Role::Student => match user.department.as_deref() {
                Some(dept) => query.filter(Column::Department.eq(dept)),
                None => return Ok(Vec::new()),
            },
            Role::Admin => query,
        };

        query.all(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    async fn faculty(db: &DatabaseConnection, email: &str, dept: &str) -> user::Model {
        user::Model::create(db, email, "pw", "Prof", Role::Faculty, Some(dept), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_starts_active_with_zero_present() {
        let db = setup_test_db().await;
        let prof = faculty(&db, "prof@example.com", "Math").await;

        let session = Model::create(&db, &prof, "Calculus I", "MATH101", "Math")
            .await
            .unwrap();

        assert!(session.active);
        assert_eq!(session.present_count, 0);
        assert!(session.end_time.is_none());
        assert_eq!(session.faculty_name, "Prof");
        assert!(!session.qr_code.is_empty());
    }

    #[tokio::test]
    async fn end_is_idempotent() {
        let db = setup_test_db().await;
        let prof = faculty(&db, "prof@example.com", "Math").await;
        let session = Model::create(&db, &prof, "Calculus I", "MATH101", "Math")
            .await
            .unwrap();

        let (ended, changed) = session.end(&db).await.unwrap();
        assert!(changed);
        assert!(!ended.active);
        let first_end = ended.end_time;
        assert!(first_end.is_some());

        let (ended_again, changed) = ended.end(&db).await.unwrap();
        assert!(!changed);
        assert_eq!(ended_again.end_time, first_end);
    }

    #[tokio::test]
    async fn listing_orders_by_start_time_desc() {
        let db = setup_test_db().await;
        let prof = faculty(&db, "prof@example.com", "Math").await;

        // Insert directly so start times disagree with insertion order.
        let now = Utc::now();
        for (code, hours_ago) in [("MATH101", 2), ("MATH102", 0), ("MATH103", 1)] {
            let session = ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                course_name: Set(code.to_string()),
                course_code: Set(code.to_string()),
                faculty_id: Set(prof.id.clone()),
                faculty_name: Set(prof.name.clone()),
                department: Set("Math".to_string()),
                start_time: Set(now - chrono::Duration::hours(hours_ago)),
                end_time: Set(None),
                active: Set(true),
                qr_code: Set(Uuid::new_v4().to_string()),
                total_students: Set(0),
                present_count: Set(0),
                created_at: Set(now),
            };
            session.insert(&db).await.unwrap();
        }

        let listed = Model::list_for(&db, &prof).await.unwrap();
        let codes: Vec<&str> = listed.iter().map(|s| s.course_code.as_str()).collect();
        assert_eq!(codes, ["MATH102", "MATH103", "MATH101"]);
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let db = setup_test_db().await;
        let prof_a = faculty(&db, "a@example.com", "Math").await;
        let prof_b = faculty(&db, "b@example.com", "Physics").await;

        Model::create(&db, &prof_a, "Calculus I", "MATH101", "Math")
            .await
            .unwrap();
        Model::create(&db, &prof_b, "Mechanics", "PHY201", "Physics")
            .await
            .unwrap();

        let student = user::Model::create(
            &db,
            "s@example.com",
            "pw",
            "Student",
            Role::Student,
            Some("Physics"),
            Some("P-1"),
        )
        .await
        .unwrap();
        let admin = user::Model::create(
            &db,
            "root@example.com",
            "pw",
            "Admin",
            Role::Admin,
            None,
            None,
        )
        .await
        .unwrap();

        let own = Model::list_for(&db, &prof_a).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].course_code, "MATH101");

        let dept = Model::list_for(&db, &student).await.unwrap();
        assert_eq!(dept.len(), 1);
        assert_eq!(dept[0].department, "Physics");

        let all = Model::list_for(&db, &admin).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
