use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// One successful check-in. Marks are immutable once written.
///
/// `(user_id, session_id)` is not unique. Repeats are suppressed by time-bounded
/// lookups and a user may mark again once the cooldown window has passed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_marks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: String,
    pub user_id: i64,
    pub name: String,
    pub regd_no: String,
    pub created_at: DateTime<Utc>,
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
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Writes a mark for `user` in `session_id`, copying their name and registration no.
    pub async fn create(
        db: &DatabaseConnection,
        session_id: &str,
        user: &super::user::Model,
        at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            session_id: Set(session_id.to_owned()),
            user_id: Set(user.id),
            name: Set(user.name.clone()),
            regd_no: Set(user.regd_no.clone()),
            created_at: Set(at),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Most recent mark by `user_id` in `session_id` created after `since`.
    pub async fn find_recent(
        db: &DatabaseConnection,
        user_id: i64,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::CreatedAt.gt(since))
            .order_by_desc(Column::CreatedAt)
            .one(db)
            .await
    }

    /// Newest `limit` marks of a session.
    pub async fn list_recent(
        db: &DatabaseConnection,
        session_id: &str,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    /// Every mark of a session, newest first.
    pub async fn list_for_session(db: &DatabaseConnection, session_id: &str) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for_session(db: &DatabaseConnection, session_id: &str) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .count(db)
            .await
    }

    /// The user's most recent mark in any session.
    pub async fn latest_for_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .one(db)
            .await
    }
}
