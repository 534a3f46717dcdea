//! 基础设施层实现。
//!
//! 提供文档存储（Postgres / 内存）、本地附件缓存文件、Telegram 附件存储等适配器，
//! 实现应用/领域层定义的接口。

pub mod attachment_store;
pub mod builder;
pub mod memory;
pub mod migrations;
pub mod repository;
pub mod telegram;

pub use attachment_store::JsonFileAttachmentStore;
pub use builder::{Infrastructure, InfrastructureError};
pub use memory::{MemoryFriendRepository, MemoryNotificationRepository};
pub use migrations::MIGRATOR;
pub use repository::{create_pg_pool, PgFriendRepository, PgNotificationRepository, PgStorage};
pub use telegram::{TelegramBlobStore, TelegramConfig};
