use std::sync::Arc;

use application::AttachmentStore;
use config::AppConfig;
use domain::{BlobStore, FriendRepository, NotificationRepository};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    attachment_store::JsonFileAttachmentStore,
    memory::{MemoryFriendRepository, MemoryNotificationRepository},
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgStorage},
    telegram::{TelegramBlobStore, TelegramConfig},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("attachment cache error: {0}")]
    AttachmentCache(#[from] application::ApplicationError),
}

/// 装配好的外部适配器
#[derive(Clone)]
pub struct Infrastructure {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub friend_repository: Arc<dyn FriendRepository>,
    pub attachment_store: Arc<dyn AttachmentStore>,
    pub blob_store: Arc<dyn BlobStore>,
}

impl Infrastructure {
    /// 配置了数据库时使用 Postgres 并执行迁移，否则退回内存存储
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let (notification_repository, friend_repository): (
            Arc<dyn NotificationRepository>,
            Arc<dyn FriendRepository>,
        ) = match &config.database.url {
            Some(url) => {
                let pool = create_pg_pool(url, config.database.max_connections).await?;
                MIGRATOR.run(&pool).await?;
                let storage = PgStorage::new(pool);
                info!("使用 Postgres 文档存储");
                let notifications: Arc<dyn NotificationRepository> = storage.notification_repository;
                let friends: Arc<dyn FriendRepository> = storage.friend_repository;
                (notifications, friends)
            }
            None => {
                warn!("未配置数据库，使用内存文档存储（重启后数据丢失）");
                let notifications: Arc<dyn NotificationRepository> =
                    Arc::new(MemoryNotificationRepository::new());
                let friends: Arc<dyn FriendRepository> = Arc::new(MemoryFriendRepository::new());
                (notifications, friends)
            }
        };

        let attachment_store: Arc<dyn AttachmentStore> =
            Arc::new(JsonFileAttachmentStore::open(&config.attachments.path).await?);
        let blob_store: Arc<dyn BlobStore> =
            Arc::new(TelegramBlobStore::new(TelegramConfig::from(&config.blob)));

        Ok(Self {
            notification_repository,
            friend_repository,
            attachment_store,
            blob_store,
        })
    }
}
