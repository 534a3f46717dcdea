//! 事件路由：把客户端事件翻译成通知存储操作与房间推送
//!
//! 非确认型处理器统一遵循：校验载荷 → 过滤自身操作 → 调用存储 →
//! 向接收者房间推送 → 记录并吞掉失败。确认型处理器返回 `{结果, error}`。

use std::sync::Arc;

use data_encoding::BASE64;
use domain::{
    AttachmentSet, Comment, ConnectionId, DataPredicate, FriendEvent, FriendEventType,
    FriendRepository, Notification, NotificationChanges, NotificationPayload,
    NotificationRepository, NotificationType, Reaction, SocialEvent, SocketEvent, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::attachment::AttachmentService;
use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::presence::PresenceRegistry;

const INVALID_PAYLOAD: &str = "Invalid payload";
const UPLOAD_FAILED: &str = "Cannot upload image";
const GET_FAILED: &str = "Cannot get attachment";
const CANCEL_FAILED: &str = "Cannot cancel friend request";

/// `attachment:upload` 的确认结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadAck {
    pub attachments: Option<AttachmentSet>,
    pub error: Option<String>,
}

impl UploadAck {
    fn failed(message: &str) -> Self {
        Self {
            attachments: None,
            error: Some(message.to_string()),
        }
    }
}

/// `attachment:get` 的确认结果，`attachment` 为 base64 内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentAck {
    pub attachment: Option<String>,
    pub error: Option<String>,
}

impl AttachmentAck {
    fn failed(message: &str) -> Self {
        Self {
            attachment: None,
            error: Some(message.to_string()),
        }
    }
}

/// `friend:cancel` 的确认结果，`notification` 为被删除的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelAck {
    pub notification: Option<Notification>,
    pub error: Option<String>,
}

impl CancelAck {
    fn removed(notification: Option<Notification>) -> Self {
        Self {
            notification,
            error: None,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            notification: None,
            error: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadRequest {
    nid: String,
}

pub struct EventRouterDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub friend_repository: Arc<dyn FriendRepository>,
    pub presence: Arc<PresenceRegistry>,
    pub attachments: Arc<AttachmentService>,
    pub clock: Arc<dyn Clock>,
}

pub struct EventRouter {
    deps: EventRouterDependencies,
}

impl EventRouter {
    pub fn new(deps: EventRouterDependencies) -> Self {
        Self { deps }
    }

    /// 按事件名分派一帧入站数据。确认型事件返回确认内容。
    pub async fn dispatch(
        &self,
        connection: ConnectionId,
        event: SocketEvent,
        data: JsonValue,
    ) -> Option<JsonValue> {
        match event {
            SocketEvent::UserOnline => {
                if let Some(user) = parse::<UserId>(event, data) {
                    self.user_online(connection, user).await;
                }
                None
            }
            SocketEvent::UserOffline => {
                if let Some(user) = parse::<UserId>(event, data) {
                    self.user_offline(connection, user).await;
                }
                None
            }
            SocketEvent::PostCommentAdd => {
                if let Some(comment) = parse::<Comment>(event, data) {
                    self.post_comment_add(comment).await;
                }
                None
            }
            SocketEvent::PostCommentRemove => {
                if let Some(comment) = parse::<Comment>(event, data) {
                    self.post_comment_remove(comment).await;
                }
                None
            }
            SocketEvent::PostReactionAdd => {
                if let Some(reaction) = parse::<Reaction>(event, data) {
                    self.post_reaction_add(reaction).await;
                }
                None
            }
            SocketEvent::PostReactionUpdate => {
                if let Some(reaction) = parse::<Reaction>(event, data) {
                    self.post_reaction_update(reaction).await;
                }
                None
            }
            SocketEvent::PostReactionRemove => {
                if let Some(reaction) = parse::<Reaction>(event, data) {
                    self.post_reaction_remove(reaction).await;
                }
                None
            }
            SocketEvent::FriendRequest
            | SocketEvent::FriendAccept
            | SocketEvent::FriendRemove
            | SocketEvent::FriendReject => {
                if let Some(friend_event) = parse::<FriendEvent>(event, data) {
                    self.friend_event(event, friend_event).await;
                }
                None
            }
            SocketEvent::FriendCancel => {
                let ack = match parse::<FriendEvent>(event, data) {
                    Some(friend_event) => self.friend_cancel(friend_event).await,
                    None => CancelAck::failed(INVALID_PAYLOAD),
                };
                to_ack(event, &ack)
            }
            SocketEvent::NotificationRead => {
                if let Some(request) = parse::<ReadRequest>(event, data) {
                    self.notification_read(request.nid).await;
                }
                None
            }
            SocketEvent::AttachmentUpload => {
                let ack = match parse::<String>(event, data) {
                    Some(encoded) => match BASE64.decode(encoded.as_bytes()) {
                        Ok(bytes) => self.attachment_upload(bytes).await,
                        Err(err) => {
                            warn!(error = %err, "附件载荷不是合法的 base64");
                            UploadAck::failed(INVALID_PAYLOAD)
                        }
                    },
                    None => UploadAck::failed(INVALID_PAYLOAD),
                };
                to_ack(event, &ack)
            }
            SocketEvent::AttachmentRemove => {
                if let Some(key) = parse::<String>(event, data) {
                    self.attachment_remove(&key);
                }
                None
            }
            SocketEvent::AttachmentGet => {
                let ack = match parse::<String>(event, data) {
                    Some(key) => self.attachment_get(&key).await,
                    None => AttachmentAck::failed(INVALID_PAYLOAD),
                };
                to_ack(event, &ack)
            }
            SocketEvent::FriendReceive
            | SocketEvent::FriendOnline
            | SocketEvent::FriendOffline
            | SocketEvent::NotificationCreate
            | SocketEvent::NotificationRemove
            | SocketEvent::NotificationUpdate => {
                warn!(connection_id = %connection, event = %event, "客户端发送了仅出站事件，忽略");
                None
            }
        }
    }

    /// 连接加入用户房间，并通知该用户的好友
    pub async fn user_online(&self, connection: ConnectionId, user: UserId) {
        if is_anonymous(user) {
            debug!(connection_id = %connection, "[user:online] 缺少用户ID，忽略");
            return;
        }
        if !self.deps.presence.join(connection, user).await {
            return;
        }
        self.notify_friends(user, SocketEvent::FriendOnline).await;
        info!(user_id = %user, "[user:online]");
    }

    pub async fn user_offline(&self, connection: ConnectionId, user: UserId) {
        if is_anonymous(user) {
            debug!(connection_id = %connection, "[user:offline] 缺少用户ID，忽略");
            return;
        }
        if !self.deps.presence.leave(connection, user).await {
            return;
        }
        self.notify_friends(user, SocketEvent::FriendOffline).await;
        info!(user_id = %user, "[user:offline]");
    }

    pub async fn post_comment_add(&self, comment: Comment) {
        if is_suppressed(SocketEvent::PostCommentAdd, &comment) {
            return;
        }
        let (uid, aid) = (comment.uid, comment.aid);
        match self
            .create_notification(NotificationPayload::PostComment(comment))
            .await
        {
            Ok(_) => info!(uid = %uid, aid = %aid, "[post:comment:add] 评论通知已创建"),
            Err(err) => error!(uid = %uid, aid = %aid, error = %err, "[post:comment:add] 创建通知失败"),
        }
    }

    pub async fn post_comment_remove(&self, comment: Comment) {
        if is_suppressed(SocketEvent::PostCommentRemove, &comment) {
            return;
        }
        match self
            .remove_by_embedded_id(NotificationType::PostComment, comment.id)
            .await
        {
            Ok(Some(_)) => info!(uid = %comment.uid, aid = %comment.aid, "[post:comment:remove] 评论通知已删除"),
            Ok(None) => debug!(id = comment.id, "[post:comment:remove] 没有对应通知"),
            Err(err) => error!(id = comment.id, error = %err, "[post:comment:remove] 删除通知失败"),
        }
    }

    pub async fn post_reaction_add(&self, reaction: Reaction) {
        if is_suppressed(SocketEvent::PostReactionAdd, &reaction) {
            return;
        }
        let (uid, aid) = (reaction.uid, reaction.aid);
        match self
            .create_notification(NotificationPayload::PostReaction(reaction))
            .await
        {
            Ok(_) => info!(uid = %uid, aid = %aid, "[post:reaction:add] 反应通知已创建"),
            Err(err) => error!(uid = %uid, aid = %aid, error = %err, "[post:reaction:add] 创建通知失败"),
        }
    }

    /// 用新的反应内容替换通知数据
    pub async fn post_reaction_update(&self, reaction: Reaction) {
        if is_suppressed(SocketEvent::PostReactionUpdate, &reaction) {
            return;
        }
        let id = reaction.id;
        match self.replace_reaction(reaction).await {
            Ok(Some(notification)) => {
                info!(nid = %notification.nid, aid = %notification.aid, "[post:reaction:update] 反应通知已更新")
            }
            Ok(None) => debug!(id, "[post:reaction:update] 没有对应通知"),
            Err(err) => error!(id, error = %err, "[post:reaction:update] 更新通知失败"),
        }
    }

    pub async fn post_reaction_remove(&self, reaction: Reaction) {
        if is_suppressed(SocketEvent::PostReactionRemove, &reaction) {
            return;
        }
        match self
            .remove_by_embedded_id(NotificationType::PostReaction, reaction.id)
            .await
        {
            Ok(Some(_)) => info!(uid = %reaction.uid, aid = %reaction.aid, "[post:reaction:remove] 反应通知已删除"),
            Ok(None) => debug!(id = reaction.id, "[post:reaction:remove] 没有对应通知"),
            Err(err) => error!(id = reaction.id, error = %err, "[post:reaction:remove] 删除通知失败"),
        }
    }

    /// `friend:request` / `friend:accept` / `friend:remove` / `friend:reject`，接收者为 `fid`
    pub async fn friend_event(&self, event: SocketEvent, friend_event: FriendEvent) {
        let event_type = match event {
            SocketEvent::FriendRequest => FriendEventType::FriendRequest,
            SocketEvent::FriendAccept => FriendEventType::FriendAccept,
            SocketEvent::FriendRemove => FriendEventType::FriendRemove,
            SocketEvent::FriendReject => FriendEventType::FriendReject,
            _ => {
                warn!(event = %event, "不是好友通知事件");
                return;
            }
        };
        let friend_event = friend_event.addressed(event_type);
        if is_suppressed(event, &friend_event) {
            return;
        }

        let (uid, fid) = (friend_event.uid, friend_event.fid);
        match self.create_notification(friend_payload(friend_event)).await {
            Ok(_) => info!(event = %event, uid = %uid, fid = %fid, "好友通知已创建"),
            Err(err) => error!(event = %event, uid = %uid, fid = %fid, error = %err, "创建好友通知失败"),
        }
    }

    /// 撤回好友请求：删除 `uid → fid` 的那条 friend_request 通知
    pub async fn friend_cancel(&self, friend_event: FriendEvent) -> CancelAck {
        let friend_event = friend_event.addressed(FriendEventType::FriendCancel);
        if is_suppressed(SocketEvent::FriendCancel, &friend_event) {
            return CancelAck::removed(None);
        }

        let predicate = DataPredicate::new()
            .eq("uid", friend_event.uid.as_i64())
            .eq("fid", friend_event.fid.as_i64())
            .eq("type", FriendEventType::FriendRequest.as_str());

        match self.remove_by_predicate(predicate).await {
            Ok(Some(notification)) => {
                info!(uid = %friend_event.uid, fid = %friend_event.fid, "[friend:cancel] 好友请求通知已删除");
                CancelAck::removed(Some(notification))
            }
            Ok(None) => {
                debug!(uid = %friend_event.uid, fid = %friend_event.fid, "[friend:cancel] 没有对应通知");
                CancelAck::removed(None)
            }
            Err(err) => {
                error!(uid = %friend_event.uid, fid = %friend_event.fid, error = %err, "[friend:cancel] 删除通知失败");
                CancelAck::failed(CANCEL_FAILED)
            }
        }
    }

    /// 标记通知已读，并同步到接收者的其他连接
    pub async fn notification_read(&self, nid: String) {
        match self.mark_read(nid.clone()).await {
            Ok(Some(notification)) => info!(nid = %nid, aid = %notification.aid, "[notification:read] 通知已读"),
            Ok(None) => debug!(nid = %nid, "[notification:read] 通知不存在"),
            Err(err) => error!(nid = %nid, error = %err, "[notification:read] 更新通知失败"),
        }
    }

    pub async fn attachment_upload(&self, bytes: Vec<u8>) -> UploadAck {
        match self.deps.attachments.upload(bytes).await {
            Ok(attachments) => UploadAck {
                attachments: Some(attachments),
                error: None,
            },
            Err(err) => {
                error!(error = %err, "[attachment:upload] 上传失败");
                UploadAck::failed(UPLOAD_FAILED)
            }
        }
    }

    pub fn attachment_remove(&self, key: &str) {
        info!(attachment = %key, "[attachment:remove]");
    }

    pub async fn attachment_get(&self, key: &str) -> AttachmentAck {
        match self.deps.attachments.resolve(key).await {
            Ok(payload) => AttachmentAck {
                attachment: Some(payload),
                error: None,
            },
            Err(err) => {
                error!(attachment = %key, error = %err, "[attachment:get] 获取附件失败");
                AttachmentAck::failed(GET_FAILED)
            }
        }
    }

    async fn notify_friends(&self, user: UserId, event: SocketEvent) {
        let friends = match self.deps.friend_repository.find_by_user(user).await {
            Ok(Some(list)) => list.friends,
            Ok(None) => return,
            Err(err) => {
                warn!(user_id = %user, error = %err, "查询好友列表失败");
                return;
            }
        };

        for friend in friends {
            self.deps
                .presence
                .broadcast_to(friend, event, JsonValue::from(user.as_i64()))
                .await;
        }
    }

    async fn create_notification(
        &self,
        payload: NotificationPayload,
    ) -> Result<Notification, ApplicationError> {
        let notification = Notification::new(payload, self.deps.clock.now());
        let notification = self
            .deps
            .notification_repository
            .create(notification)
            .await?;
        self.push(SocketEvent::NotificationCreate, &notification)
            .await;
        Ok(notification)
    }

    async fn remove_by_embedded_id(
        &self,
        kind: NotificationType,
        id: i64,
    ) -> Result<Option<Notification>, ApplicationError> {
        let found = self
            .deps
            .notification_repository
            .find_by_embedded_id(kind, id)
            .await?;
        self.remove(found).await
    }

    async fn remove_by_predicate(
        &self,
        predicate: DataPredicate,
    ) -> Result<Option<Notification>, ApplicationError> {
        let found = self
            .deps
            .notification_repository
            .find_by_data(predicate)
            .await?;
        self.remove(found).await
    }

    async fn remove(
        &self,
        found: Option<Notification>,
    ) -> Result<Option<Notification>, ApplicationError> {
        let Some(notification) = found else {
            return Ok(None);
        };
        self.deps
            .notification_repository
            .delete(notification.nid.clone())
            .await?;
        self.push(SocketEvent::NotificationRemove, &notification)
            .await;
        Ok(Some(notification))
    }

    async fn replace_reaction(
        &self,
        reaction: Reaction,
    ) -> Result<Option<Notification>, ApplicationError> {
        let Some(existing) = self
            .deps
            .notification_repository
            .find_by_embedded_id(NotificationType::PostReaction, reaction.id)
            .await?
        else {
            return Ok(None);
        };

        let updated = self
            .deps
            .notification_repository
            .update(
                existing.nid,
                NotificationChanges::replace_data(NotificationPayload::PostReaction(reaction)),
            )
            .await?;
        self.push(SocketEvent::NotificationUpdate, &updated).await;
        Ok(Some(updated))
    }

    async fn mark_read(&self, nid: String) -> Result<Option<Notification>, ApplicationError> {
        if self
            .deps
            .notification_repository
            .find_by_nid(nid.clone())
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let updated = self
            .deps
            .notification_repository
            .update(nid, NotificationChanges::mark_read())
            .await?;
        self.push(SocketEvent::NotificationRead, &updated).await;
        Ok(Some(updated))
    }

    async fn push(&self, event: SocketEvent, notification: &Notification) {
        match serde_json::to_value(notification) {
            Ok(payload) => {
                self.deps
                    .presence
                    .broadcast_to(notification.aid, event, payload)
                    .await;
            }
            Err(err) => error!(nid = %notification.nid, error = %err, "通知序列化失败"),
        }
    }
}

fn parse<T: DeserializeOwned>(event: SocketEvent, data: JsonValue) -> Option<T> {
    if data.is_null() {
        debug!(event = %event, "载荷为空，忽略");
        return None;
    }
    match serde_json::from_value(data) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(event = %event, error = %err, "载荷格式错误，忽略");
            None
        }
    }
}

fn to_ack<T: Serialize>(event: SocketEvent, ack: &T) -> Option<JsonValue> {
    match serde_json::to_value(ack) {
        Ok(value) => Some(value),
        Err(err) => {
            error!(event = %event, error = %err, "确认内容序列化失败");
            None
        }
    }
}

/// 客户端未登录时会发送 0
fn is_anonymous(user: UserId) -> bool {
    user.as_i64() == 0
}

fn is_suppressed(event: SocketEvent, social_event: &impl SocialEvent) -> bool {
    match social_event.ensure_not_self() {
        Ok(()) => false,
        Err(err) => {
            debug!(event = %event, reason = %err, "自身操作，不产生通知");
            true
        }
    }
}

/// 好友请求对接收方而言是一条 friend_receive 通知
fn friend_payload(friend_event: FriendEvent) -> NotificationPayload {
    match friend_event.event_type {
        FriendEventType::FriendRequest => NotificationPayload::FriendReceive(friend_event),
        FriendEventType::FriendAccept => NotificationPayload::FriendAccept(friend_event),
        FriendEventType::FriendRemove => NotificationPayload::FriendRemove(friend_event),
        FriendEventType::FriendReject => NotificationPayload::FriendReject(friend_event),
        FriendEventType::FriendCancel => NotificationPayload::FriendCancel(friend_event),
    }
}
