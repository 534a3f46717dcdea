//! 传输层事件名称
//!
//! 入站事件由客户端发出，出站事件定向发送到某个用户房间。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketEvent {
    #[serde(rename = "user:online")]
    UserOnline,
    #[serde(rename = "user:offline")]
    UserOffline,

    #[serde(rename = "post:comment:add")]
    PostCommentAdd,
    #[serde(rename = "post:comment:remove")]
    PostCommentRemove,
    #[serde(rename = "post:reaction:add")]
    PostReactionAdd,
    #[serde(rename = "post:reaction:update")]
    PostReactionUpdate,
    #[serde(rename = "post:reaction:remove")]
    PostReactionRemove,

    #[serde(rename = "friend:request")]
    FriendRequest,
    #[serde(rename = "friend:receive")]
    FriendReceive,
    #[serde(rename = "friend:accept")]
    FriendAccept,
    #[serde(rename = "friend:remove")]
    FriendRemove,
    #[serde(rename = "friend:reject")]
    FriendReject,
    #[serde(rename = "friend:cancel")]
    FriendCancel,
    #[serde(rename = "friend:online")]
    FriendOnline,
    #[serde(rename = "friend:offline")]
    FriendOffline,

    #[serde(rename = "notification:read")]
    NotificationRead,
    #[serde(rename = "notification:create")]
    NotificationCreate,
    #[serde(rename = "notification:remove")]
    NotificationRemove,
    #[serde(rename = "notification:update")]
    NotificationUpdate,

    #[serde(rename = "attachment:upload")]
    AttachmentUpload,
    #[serde(rename = "attachment:remove")]
    AttachmentRemove,
    #[serde(rename = "attachment:get")]
    AttachmentGet,
}

impl SocketEvent {
    pub const ALL: [SocketEvent; 22] = [
        SocketEvent::UserOnline,
        SocketEvent::UserOffline,
        SocketEvent::PostCommentAdd,
        SocketEvent::PostCommentRemove,
        SocketEvent::PostReactionAdd,
        SocketEvent::PostReactionUpdate,
        SocketEvent::PostReactionRemove,
        SocketEvent::FriendRequest,
        SocketEvent::FriendReceive,
        SocketEvent::FriendAccept,
        SocketEvent::FriendRemove,
        SocketEvent::FriendReject,
        SocketEvent::FriendCancel,
        SocketEvent::FriendOnline,
        SocketEvent::FriendOffline,
        SocketEvent::NotificationRead,
        SocketEvent::NotificationCreate,
        SocketEvent::NotificationRemove,
        SocketEvent::NotificationUpdate,
        SocketEvent::AttachmentUpload,
        SocketEvent::AttachmentRemove,
        SocketEvent::AttachmentGet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocketEvent::UserOnline => "user:online",
            SocketEvent::UserOffline => "user:offline",
            SocketEvent::PostCommentAdd => "post:comment:add",
            SocketEvent::PostCommentRemove => "post:comment:remove",
            SocketEvent::PostReactionAdd => "post:reaction:add",
            SocketEvent::PostReactionUpdate => "post:reaction:update",
            SocketEvent::PostReactionRemove => "post:reaction:remove",
            SocketEvent::FriendRequest => "friend:request",
            SocketEvent::FriendReceive => "friend:receive",
            SocketEvent::FriendAccept => "friend:accept",
            SocketEvent::FriendRemove => "friend:remove",
            SocketEvent::FriendReject => "friend:reject",
            SocketEvent::FriendCancel => "friend:cancel",
            SocketEvent::FriendOnline => "friend:online",
            SocketEvent::FriendOffline => "friend:offline",
            SocketEvent::NotificationRead => "notification:read",
            SocketEvent::NotificationCreate => "notification:create",
            SocketEvent::NotificationRemove => "notification:remove",
            SocketEvent::NotificationUpdate => "notification:update",
            SocketEvent::AttachmentUpload => "attachment:upload",
            SocketEvent::AttachmentRemove => "attachment:remove",
            SocketEvent::AttachmentGet => "attachment:get",
        }
    }
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocketEvent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| DomainError::validation_error("event", format!("unknown event `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for event in SocketEvent::ALL {
            assert_eq!(event.as_str().parse::<SocketEvent>().unwrap(), event);
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event.as_str()));
        }
    }

    #[test]
    fn unknown_event_is_a_validation_error() {
        let err = "post:share".parse::<SocketEvent>().unwrap_err();
        assert!(matches!(err, DomainError::ValidationError { .. }));
    }
}
