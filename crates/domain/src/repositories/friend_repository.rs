//! 好友列表存储接口

use serde::{Deserialize, Serialize};

use crate::repositories::RepositoryFuture;
use crate::value_objects::UserId;

/// 某个用户的好友列表，由外部系统维护，这里只读
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendList {
    pub uid: UserId,
    #[serde(default)]
    pub friends: Vec<UserId>,
}

impl FriendList {
    pub fn new(uid: UserId, friends: Vec<UserId>) -> Self {
        Self { uid, friends }
    }
}

#[cfg_attr(feature = "testing", mockall::automock)]
pub trait FriendRepository: Send + Sync {
    /// 没有记录时返回 `None`
    fn find_by_user(&self, uid: UserId) -> RepositoryFuture<Option<FriendList>>;
}
