use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents a user in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name shown on the instructor's live feed.
    pub name: String,
    /// User's unique email address.
    #[sea_orm(unique)]
    pub email: String,
    /// Registration (student) number.
    pub regd_no: String,
    pub role: Role,
    /// Argon2 PHC string. `None` for accounts that cannot log in with a password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

/// Account role. Only instructors may own sessions and open a session connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "instructor")]
    Instructor,

    #[sea_orm(string_value = "student")]
    Student,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::attendance_mark::Entity")]
    AttendanceMarks,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::attendance_mark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceMarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        regd_no: &str,
        role: Role,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            regd_no: Set(regd_no.to_owned()),
            role: Set(role),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Creates a user that can log in with `password`. The password is stored as an argon2 hash.
    pub async fn register(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        regd_no: &str,
        role: Role,
        password: &str,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            regd_no: Set(regd_no.to_owned()),
            role: Set(role),
            password_hash: Set(Some(hash_password(password)?)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Looks up `email` and checks `password` against the stored hash.
    ///
    /// Returns `Ok(None)` for an unknown email, a wrong password, or an account without a password.
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, DbErr> {
        Ok(Self::find_by_email(db, email.trim())
            .await?
            .filter(|user| user.verify_password(password)))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            return false;
        };
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Email.eq(email)).one(db).await
    }

    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

fn hash_password(password: &str) -> Result<String, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("failed to hash password: {e}")))
}
