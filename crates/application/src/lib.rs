//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例：在线房间管理、通知生命周期路由，
//! 以及本地缓存优先的附件代理。外部适配器（文档存储、远程附件存储、
//! 本地缓存文件）都通过接口注入。

pub mod attachment;
pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod event_router;
pub mod presence;

pub use attachment::{
    sniff_image_type, AttachmentService, AttachmentServiceDependencies, AttachmentStore,
    ImageType,
};
pub use broadcaster::{EventSender, ServerEvent};
pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use event_router::{
    AttachmentAck, CancelAck, EventRouter, EventRouterDependencies, UploadAck,
};
pub use presence::PresenceRegistry;
