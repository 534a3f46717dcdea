//! 通知存储接口

use serde_json::{Map, Value as JsonValue};

use crate::entities::{Notification, NotificationChanges, NotificationType};
use crate::repositories::RepositoryFuture;

/// 针对通知 `data` 字段的等值谓词，所有条件同时成立才算匹配
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPredicate {
    conditions: Vec<(String, JsonValue)>,
}

impl DataPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条件 `data.<key> == value`
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, JsonValue)] {
        &self.conditions
    }

    /// 对一份 `data` 文档求值
    pub fn matches(&self, data: &JsonValue) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| data.get(key) == Some(expected))
    }

    /// 转成 JSON 对象，供 JSONB `@>` 包含查询使用
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self.conditions.iter().cloned().collect();
        JsonValue::Object(map)
    }
}

#[cfg_attr(feature = "testing", mockall::automock)]
pub trait NotificationRepository: Send + Sync {
    fn create(&self, notification: Notification) -> RepositoryFuture<Notification>;
    fn find_by_nid(&self, nid: String) -> RepositoryFuture<Option<Notification>>;
    /// 按原始事件ID反查；ID 只在同一类别内唯一，所以需要带上类型
    fn find_by_embedded_id(
        &self,
        kind: NotificationType,
        id: i64,
    ) -> RepositoryFuture<Option<Notification>>;
    /// 多条匹配时返回存储顺序中的第一条
    fn find_by_data(&self, predicate: DataPredicate) -> RepositoryFuture<Option<Notification>>;
    /// 记录不存在时返回 `RepositoryError::NotFound`
    fn update(&self, nid: String, changes: NotificationChanges) -> RepositoryFuture<Notification>;
    /// 删除不存在的记录不算错误
    fn delete(&self, nid: String) -> RepositoryFuture<()>;
}
