use std::sync::Arc;

use application::{
    AttachmentService, AttachmentServiceDependencies, AttachmentStore, Clock, EventRouter,
    EventRouterDependencies, PresenceRegistry,
};
use domain::{BlobStore, FriendRepository, NotificationRepository};

pub struct StateDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub friend_repository: Arc<dyn FriendRepository>,
    pub attachment_store: Arc<dyn AttachmentStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
    pub max_frame_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EventRouter>,
    pub presence: Arc<PresenceRegistry>,
    pub attachments: Arc<AttachmentService>,
    pub max_frame_bytes: usize,
}

impl AppState {
    pub fn new(deps: StateDependencies) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let attachments = Arc::new(AttachmentService::new(AttachmentServiceDependencies {
            store: deps.attachment_store,
            blob_store: deps.blob_store,
        }));
        let router = Arc::new(EventRouter::new(EventRouterDependencies {
            notification_repository: deps.notification_repository,
            friend_repository: deps.friend_repository,
            presence: presence.clone(),
            attachments: attachments.clone(),
            clock: deps.clock,
        }));

        Self {
            router,
            presence,
            attachments,
            max_frame_bytes: deps.max_frame_bytes,
        }
    }
}
