//! 文档存储接口定义
//!
//! 内层定义接口，外层（Postgres / 内存）实现接口。

use futures::future::BoxFuture;

use crate::errors::RepositoryError;

pub mod friend_repository;
pub mod notification_repository;

pub use friend_repository::{FriendList, FriendRepository};
pub use notification_repository::{DataPredicate, NotificationRepository};

#[cfg(feature = "testing")]
pub use friend_repository::MockFriendRepository;
#[cfg(feature = "testing")]
pub use notification_repository::MockNotificationRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type RepositoryFuture<T> = BoxFuture<'static, RepositoryResult<T>>;
