//! 社交领域事件
//!
//! 评论、反应、好友事件由客户端产生，描述 `uid`（执行者）对 `aid`（接收者）
//! 的一次动作。载荷不可变；`id` 在同一类别内唯一，用于之后反查通知。

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::UserId;

/// 所有能触发通知的领域事件共有的行为
pub trait SocialEvent {
    /// 事件在其类别内的唯一ID
    fn event_id(&self) -> i64;
    /// 执行动作的用户
    fn actor(&self) -> UserId;
    /// 通知接收者
    fn recipient(&self) -> UserId;

    fn is_self_action(&self) -> bool {
        self.actor() == self.recipient()
    }

    /// 自身操作一律不产生通知
    fn ensure_not_self(&self) -> DomainResult<()> {
        if self.is_self_action() {
            return Err(DomainError::self_action(self.actor().as_i64()));
        }
        Ok(())
    }
}

/// 帖子评论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub uid: UserId,
    #[serde(default)]
    pub pid: i64,
    #[serde(default)]
    pub cid: String,
    pub aid: UserId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: i64,
}

impl SocialEvent for Comment {
    fn event_id(&self) -> i64 {
        self.id
    }

    fn actor(&self) -> UserId {
        self.uid
    }

    fn recipient(&self) -> UserId {
        self.aid
    }
}

/// 反应类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    #[default]
    Like,
    Love,
    Care,
    Haha,
    Wow,
    Sad,
    Angry,
}

/// 帖子反应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: i64,
    pub uid: UserId,
    #[serde(default)]
    pub pid: i64,
    #[serde(rename = "type", default)]
    pub reaction_type: ReactionType,
    #[serde(default)]
    pub rid: String,
    pub aid: UserId,
    #[serde(default)]
    pub created_at: i64,
}

impl SocialEvent for Reaction {
    fn event_id(&self) -> i64 {
        self.id
    }

    fn actor(&self) -> UserId {
        self.uid
    }

    fn recipient(&self) -> UserId {
        self.aid
    }
}

/// 好友事件类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendEventType {
    #[default]
    FriendRequest,
    FriendAccept,
    FriendRemove,
    FriendReject,
    FriendCancel,
}

impl FriendEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendEventType::FriendRequest => "friend_request",
            FriendEventType::FriendAccept => "friend_accept",
            FriendEventType::FriendRemove => "friend_remove",
            FriendEventType::FriendReject => "friend_reject",
            FriendEventType::FriendCancel => "friend_cancel",
        }
    }
}

/// 好友事件
///
/// 客户端只保证 `uid` 与 `fid`；`aid` 由 [`FriendEvent::addressed`] 从 `fid` 重映射。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEvent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub aid: UserId,
    pub uid: UserId,
    pub fid: UserId,
    #[serde(rename = "type", default)]
    pub event_type: FriendEventType,
    #[serde(default)]
    pub created_at: i64,
}

impl FriendEvent {
    /// 接收者改写为 `fid`，事件类型按入站事件归一
    pub fn addressed(mut self, event_type: FriendEventType) -> Self {
        self.aid = self.fid;
        self.event_type = event_type;
        self
    }
}

impl SocialEvent for FriendEvent {
    fn event_id(&self) -> i64 {
        self.id
    }

    fn actor(&self) -> UserId {
        self.uid
    }

    fn recipient(&self) -> UserId {
        self.aid
    }
}
