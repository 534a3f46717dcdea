//! 通知实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::events::{Comment, FriendEvent, Reaction, SocialEvent};
use crate::value_objects::UserId;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PostComment,
    PostReaction,
    FriendRequest,
    FriendAccept,
    FriendRemove,
    FriendReject,
    FriendCancel,
    FriendReceive,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PostComment => "post_comment",
            NotificationType::PostReaction => "post_reaction",
            NotificationType::FriendRequest => "friend_request",
            NotificationType::FriendAccept => "friend_accept",
            NotificationType::FriendRemove => "friend_remove",
            NotificationType::FriendReject => "friend_reject",
            NotificationType::FriendCancel => "friend_cancel",
            NotificationType::FriendReceive => "friend_receive",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 通知携带的原始事件
///
/// 判别字段就是通知的 `type`，线上格式为 `{"type": ..., "data": {...}}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    PostComment(Comment),
    PostReaction(Reaction),
    FriendRequest(FriendEvent),
    FriendAccept(FriendEvent),
    FriendRemove(FriendEvent),
    FriendReject(FriendEvent),
    FriendCancel(FriendEvent),
    FriendReceive(FriendEvent),
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationType {
        match self {
            NotificationPayload::PostComment(_) => NotificationType::PostComment,
            NotificationPayload::PostReaction(_) => NotificationType::PostReaction,
            NotificationPayload::FriendRequest(_) => NotificationType::FriendRequest,
            NotificationPayload::FriendAccept(_) => NotificationType::FriendAccept,
            NotificationPayload::FriendRemove(_) => NotificationType::FriendRemove,
            NotificationPayload::FriendReject(_) => NotificationType::FriendReject,
            NotificationPayload::FriendCancel(_) => NotificationType::FriendCancel,
            NotificationPayload::FriendReceive(_) => NotificationType::FriendReceive,
        }
    }

    fn event(&self) -> &dyn SocialEvent {
        match self {
            NotificationPayload::PostComment(comment) => comment,
            NotificationPayload::PostReaction(reaction) => reaction,
            NotificationPayload::FriendRequest(event)
            | NotificationPayload::FriendAccept(event)
            | NotificationPayload::FriendRemove(event)
            | NotificationPayload::FriendReject(event)
            | NotificationPayload::FriendCancel(event)
            | NotificationPayload::FriendReceive(event) => event,
        }
    }

    pub fn event_id(&self) -> i64 {
        self.event().event_id()
    }

    pub fn recipient(&self) -> UserId {
        self.event().recipient()
    }

    /// 只取 `data` 部分，供谓词匹配和文档存储使用
    pub fn data_json(&self) -> JsonValue {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(mut map)) => map.remove("data").unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }

    /// 由存储中的 `type` 与 `data` 列还原
    pub fn from_parts(kind: &str, data: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({ "type": kind, "data": data }))
    }
}

/// 通知实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 通知ID（UUID v4）
    pub nid: String,
    /// 原始事件ID，用于反查
    pub id: i64,
    /// 接收者
    pub aid: UserId,
    /// 是否已读
    pub read: bool,
    #[serde(flatten)]
    pub payload: NotificationPayload,
    /// 创建时间，线上为毫秒时间戳
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 创建新通知
    pub fn new(payload: NotificationPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            nid: Uuid::new_v4().to_string(),
            id: payload.event_id(),
            aid: payload.recipient(),
            read: false,
            payload,
            created_at,
        }
    }

    pub fn kind(&self) -> NotificationType {
        self.payload.kind()
    }

    /// 标记为已读
    pub fn mark_as_read(&mut self) {
        self.read = true;
    }
}

/// 通知的部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationChanges {
    pub data: Option<NotificationPayload>,
    pub read: Option<bool>,
}

impl NotificationChanges {
    pub fn replace_data(payload: NotificationPayload) -> Self {
        Self {
            data: Some(payload),
            read: None,
        }
    }

    pub fn mark_read() -> Self {
        Self {
            data: None,
            read: Some(true),
        }
    }

    pub fn apply(&self, notification: &mut Notification) {
        if let Some(payload) = &self.data {
            notification.payload = payload.clone();
        }
        if let Some(read) = self.read {
            notification.read = read;
        }
    }
}
