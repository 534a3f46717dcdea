//! 内存文档存储，未配置数据库时使用，进程重启即丢失

use std::collections::HashMap;
use std::sync::Arc;

use domain::{
    DataPredicate, FriendList, FriendRepository, Notification, NotificationChanges,
    NotificationRepository, NotificationType, RepositoryError, RepositoryFuture, UserId,
};
use tokio::sync::RwLock;

/// 按插入顺序保存通知
#[derive(Clone, Default)]
pub struct MemoryNotificationRepository {
    records: Arc<RwLock<Vec<Notification>>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Vec<Notification> {
        self.records.read().await.clone()
    }
}

impl NotificationRepository for MemoryNotificationRepository {
    fn create(&self, notification: Notification) -> RepositoryFuture<Notification> {
        let records = self.records.clone();
        Box::pin(async move {
            let mut guard = records.write().await;
            if guard.iter().any(|n| n.nid == notification.nid) {
                return Err(RepositoryError::storage(format!(
                    "duplicate nid {}",
                    notification.nid
                )));
            }
            guard.push(notification.clone());
            Ok(notification)
        })
    }

    fn find_by_nid(&self, nid: String) -> RepositoryFuture<Option<Notification>> {
        let records = self.records.clone();
        Box::pin(async move {
            let guard = records.read().await;
            Ok(guard.iter().find(|n| n.nid == nid).cloned())
        })
    }

    fn find_by_embedded_id(
        &self,
        kind: NotificationType,
        id: i64,
    ) -> RepositoryFuture<Option<Notification>> {
        let records = self.records.clone();
        Box::pin(async move {
            let guard = records.read().await;
            Ok(guard
                .iter()
                .find(|n| n.kind() == kind && n.id == id)
                .cloned())
        })
    }

    fn find_by_data(&self, predicate: DataPredicate) -> RepositoryFuture<Option<Notification>> {
        let records = self.records.clone();
        Box::pin(async move {
            let guard = records.read().await;
            Ok(guard
                .iter()
                .find(|n| predicate.matches(&n.payload.data_json()))
                .cloned())
        })
    }

    fn update(&self, nid: String, changes: NotificationChanges) -> RepositoryFuture<Notification> {
        let records = self.records.clone();
        Box::pin(async move {
            let mut guard = records.write().await;
            let record = guard
                .iter_mut()
                .find(|n| n.nid == nid)
                .ok_or(RepositoryError::NotFound)?;
            changes.apply(record);
            Ok(record.clone())
        })
    }

    fn delete(&self, nid: String) -> RepositoryFuture<()> {
        let records = self.records.clone();
        Box::pin(async move {
            records.write().await.retain(|n| n.nid != nid);
            Ok(())
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryFriendRepository {
    lists: Arc<RwLock<HashMap<UserId, Vec<UserId>>>>,
}

impl MemoryFriendRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 好友关系由外部系统维护，这里只提供写入入口给装配与测试
    pub async fn set_friends(&self, uid: UserId, friends: Vec<UserId>) {
        self.lists.write().await.insert(uid, friends);
    }
}

impl FriendRepository for MemoryFriendRepository {
    fn find_by_user(&self, uid: UserId) -> RepositoryFuture<Option<FriendList>> {
        let lists = self.lists.clone();
        Box::pin(async move {
            let guard = lists.read().await;
            Ok(guard
                .get(&uid)
                .map(|friends| FriendList::new(uid, friends.clone())))
        })
    }
}
