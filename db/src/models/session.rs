use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

/// Length of generated session ids.
pub const SESSION_ID_LEN: usize = 8;

/// A time-boxed attendance window owned by an instructor.
///
/// `expiry_time` is the only expiry field. Once `active` is false the session is
/// terminal; nothing in this crate sets it back to true.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: i64,
    pub name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::attendance_mark::Entity")]
    Marks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::attendance_mark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Marks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

impl Model {
    /// Starts a new active session for `owner_id` lasting `ttl` from `now`.
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i64,
        name: Option<&str>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let expiry_time = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DbErr::Custom(format!("session ttl of {ttl} is out of range")))?;
        let active = ActiveModel {
            id: Set(generate_id()),
            owner_id: Set(owner_id),
            name: Set(name.map(str::to_owned)),
            active: Set(true),
            created_at: Set(now),
            expiry_time: Set(expiry_time),
        };
        active.insert(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id.to_owned()).one(db).await
    }

    /// Active session `id` owned by `owner_id`. Expiry is left to the caller so it can
    /// be reported separately.
    pub async fn find_active_owned(
        db: &DatabaseConnection,
        id: &str,
        owner_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id.to_owned())
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Active.eq(true))
            .one(db)
            .await
    }

    /// Session `id` if it is active and not yet expired at `now`.
    pub async fn find_open(
        db: &DatabaseConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id.to_owned())
            .filter(Column::Active.eq(true))
            .filter(Column::ExpiryTime.gt(now))
            .one(db)
            .await
    }

    /// Marks an active session inactive and clamps its expiry to `now`.
    ///
    /// When `owner_id` is given the session must belong to that user. Returns the
    /// updated row, or `None` if there was no matching active session.
    pub async fn deactivate(
        db: &DatabaseConnection,
        id: &str,
        owner_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let mut query = Entity::find_by_id(id.to_owned()).filter(Column::Active.eq(true));
        if let Some(owner_id) = owner_id {
            query = query.filter(Column::OwnerId.eq(owner_id));
        }
        let Some(session) = query.one(db).await? else {
            return Ok(None);
        };

        let expiry = session.expiry_time.min(now);
        let mut active: ActiveModel = session.into();
        active.active = Set(false);
        active.expiry_time = Set(expiry);
        active.update(db).await.map(Some)
    }

    /// Sessions owned by `owner_id`, newest first, created strictly before `cursor`.
    pub async fn history_for_owner(
        db: &DatabaseConnection,
        owner_id: i64,
        cursor: Option<DateTime<Utc>>,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find().filter(Column::OwnerId.eq(owner_id));
        if let Some(cursor) = cursor {
            query = query.filter(Column::CreatedAt.lt(cursor));
        }
        query
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }

    /// Time left until expiry, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expiry_time - now).max(Duration::zero())
    }
}
