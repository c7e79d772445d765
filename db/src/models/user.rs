use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Represents an account in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Opaque unique identifier (UUID v4, assigned at registration).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Unique email address, used as the login name.
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Home department. Required for students and faculty, absent for admins.
    pub department: Option<String>,
    /// Institutional student number, if the user is a student.
    pub student_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Access level of an account. Stored as a lowercase string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,

    #[sea_orm(string_value = "faculty")]
    Faculty,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
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
    /// Insert a new user with a freshly hashed password.
    ///
    /// A duplicate email surfaces as the database's unique-constraint
    /// error; callers translate that into their own conflict type.
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
        department: Option<&str>,
        student_number: Option<&str>,
    ) -> Result<Self, DbErr> {
        let hash = Self::hash_password(password)?;

        let user = ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.to_lowercase()),
            name: Set(name.to_string()),
            role: Set(role),
            department: Set(department.map(str::to_string)),
            student_number: Set(student_number.map(str::to_string)),
            password_hash: Set(hash),
            created_at: Set(Utc::now()),
        };

        user.insert(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(db)
            .await
    }

    /// Look up by email and check the password. `Ok(None)` covers both an
    /// unknown email and a wrong password, so callers cannot leak which
    /// one failed.
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, DbErr> {
        if let Some(user) = Self::find_by_email(db, email).await? {
            if user.verify_password(password) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))?
            .to_string())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
