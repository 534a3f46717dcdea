use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{
    DataPredicate, FriendList, FriendRepository, Notification, NotificationChanges,
    NotificationPayload, NotificationRepository, NotificationType, RepositoryError,
    RepositoryFuture, UserId,
};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct NotificationRecord {
    nid: String,
    id: i64,
    aid: i64,
    kind: String,
    read: bool,
    data: Json<JsonValue>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = RepositoryError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        let payload = NotificationPayload::from_parts(&value.kind, value.data.0)
            .map_err(|err| invalid_data(format!("notification {}: {err}", value.nid)))?;

        Ok(Notification {
            nid: value.nid,
            id: value.id,
            aid: UserId::new(value.aid),
            read: value.read,
            payload,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct FriendRecord {
    uid: i64,
    friends: Vec<i64>,
}

impl From<FriendRecord> for FriendList {
    fn from(value: FriendRecord) -> Self {
        FriendList::new(
            UserId::new(value.uid),
            value.friends.into_iter().map(UserId::new).collect(),
        )
    }
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl NotificationRepository for PgNotificationRepository {
    fn create(&self, notification: Notification) -> RepositoryFuture<Notification> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let record = sqlx::query_as::<_, NotificationRecord>(
                r#"
                INSERT INTO notifications (nid, id, aid, type, read, data, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING nid, id, aid, type AS kind, read, data, created_at
                "#,
            )
            .bind(&notification.nid)
            .bind(notification.id)
            .bind(notification.aid.as_i64())
            .bind(notification.kind().as_str())
            .bind(notification.read)
            .bind(Json(notification.payload.data_json()))
            .bind(notification.created_at)
            .fetch_one(&pool)
            .await
            .map_err(map_sqlx_err)?;

            Notification::try_from(record)
        })
    }

    fn find_by_nid(&self, nid: String) -> RepositoryFuture<Option<Notification>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let record = sqlx::query_as::<_, NotificationRecord>(
                r#"SELECT nid, id, aid, type AS kind, read, data, created_at FROM notifications WHERE nid = $1"#,
            )
            .bind(nid)
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_err)?;

            record.map(Notification::try_from).transpose()
        })
    }

    fn find_by_embedded_id(
        &self,
        kind: NotificationType,
        id: i64,
    ) -> RepositoryFuture<Option<Notification>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let record = sqlx::query_as::<_, NotificationRecord>(
                r#"
                SELECT nid, id, aid, type AS kind, read, data, created_at
                FROM notifications
                WHERE type = $1 AND id = $2
                ORDER BY seq
                LIMIT 1
                "#,
            )
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_err)?;

            record.map(Notification::try_from).transpose()
        })
    }

    fn find_by_data(&self, predicate: DataPredicate) -> RepositoryFuture<Option<Notification>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            // JSONB 包含查询，等价于对 data.* 的等值条件取 AND
            let record = sqlx::query_as::<_, NotificationRecord>(
                r#"
                SELECT nid, id, aid, type AS kind, read, data, created_at
                FROM notifications
                WHERE data @> $1
                ORDER BY seq
                LIMIT 1
                "#,
            )
            .bind(Json(predicate.to_json()))
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_err)?;

            record.map(Notification::try_from).transpose()
        })
    }

    fn update(&self, nid: String, changes: NotificationChanges) -> RepositoryFuture<Notification> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let kind = changes.data.as_ref().map(|payload| payload.kind().as_str());
            let data = changes.data.as_ref().map(|payload| Json(payload.data_json()));

            let record = sqlx::query_as::<_, NotificationRecord>(
                r#"
                UPDATE notifications
                SET type = COALESCE($2, type), data = COALESCE($3, data), read = COALESCE($4, read)
                WHERE nid = $1
                RETURNING nid, id, aid, type AS kind, read, data, created_at
                "#,
            )
            .bind(&nid)
            .bind(kind)
            .bind(data)
            .bind(changes.read)
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_err)?
            .ok_or(RepositoryError::NotFound)?;

            Notification::try_from(record)
        })
    }

    fn delete(&self, nid: String) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        Box::pin(async move {
            sqlx::query("DELETE FROM notifications WHERE nid = $1")
                .bind(nid)
                .execute(&pool)
                .await
                .map_err(map_sqlx_err)?;
            Ok(())
        })
    }
}

#[derive(Clone)]
pub struct PgFriendRepository {
    pool: PgPool,
}

impl PgFriendRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FriendRepository for PgFriendRepository {
    fn find_by_user(&self, uid: UserId) -> RepositoryFuture<Option<FriendList>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let record = sqlx::query_as::<_, FriendRecord>(
                r#"SELECT uid, friends FROM friends WHERE uid = $1"#,
            )
            .bind(uid.as_i64())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_err)?;

            Ok(record.map(FriendList::from))
        })
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub friend_repository: Arc<PgFriendRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            notification_repository: Arc::new(PgNotificationRepository::new(pool.clone())),
            friend_repository: Arc::new(PgFriendRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
