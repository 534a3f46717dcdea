//! 领域实体定义
//!
//! 通知记录与附件引用。

pub mod attachment;
pub mod notification;

// 重新导出核心实体
pub use attachment::{AttachmentRecord, AttachmentSet, BlobVariant};
pub use notification::{Notification, NotificationChanges, NotificationPayload, NotificationType};
