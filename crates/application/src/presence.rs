//! 在线房间管理
//!
//! 每个用户ID对应一个房间，房间成员是连接。一个连接可以加入多个房间，
//! 同一连接对同一房间只加入一次。房间不持久化，客户端重连后通过
//! `user:online` 重新加入。

use std::collections::{HashMap, HashSet};

use domain::{ConnectionId, SocketEvent, UserId};
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::broadcaster::{EventSender, ServerEvent};

struct ConnectionEntry {
    sender: EventSender,
    rooms: HashSet<UserId>,
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<UserId, HashSet<ConnectionId>>,
}

impl RegistryState {
    fn detach(&mut self, connection: ConnectionId, user: UserId) {
        if let Some(members) = self.rooms.get_mut(&user) {
            members.remove(&connection);
            if members.is_empty() {
                self.rooms.remove(&user);
            }
        }
    }
}

/// 连接与房间的双向索引
///
/// 加入、离开与广播共用一把读写锁，成员变更与广播读取互不交错。
#[derive(Default)]
pub struct PresenceRegistry {
    state: RwLock<RegistryState>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 传输层接受连接时调用，房间成员关系初始为空
    pub async fn register(&self, connection: ConnectionId, sender: EventSender) {
        let mut state = self.state.write().await;
        state.connections.insert(
            connection,
            ConnectionEntry {
                sender,
                rooms: HashSet::new(),
            },
        );
        debug!(connection_id = %connection, "连接已注册");
    }

    /// 连接断开时调用，从所有房间移除，返回它曾加入的房间
    pub async fn unregister(&self, connection: ConnectionId) -> Vec<UserId> {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.remove(&connection) else {
            return Vec::new();
        };

        let rooms: Vec<UserId> = entry.rooms.into_iter().collect();
        for user in &rooms {
            state.detach(connection, *user);
        }

        debug!(connection_id = %connection, rooms = rooms.len(), "连接已注销");
        rooms
    }

    /// 加入房间；已是成员或连接未注册时返回 `false`
    pub async fn join(&self, connection: ConnectionId, user: UserId) -> bool {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.get_mut(&connection) else {
            warn!(connection_id = %connection, user_id = %user, "未注册的连接尝试加入房间");
            return false;
        };

        if !entry.rooms.insert(user) {
            return false;
        }
        state.rooms.entry(user).or_default().insert(connection);

        info!(connection_id = %connection, user_id = %user, "连接加入用户房间");
        true
    }

    /// 离开房间；不是成员时返回 `false`
    pub async fn leave(&self, connection: ConnectionId, user: UserId) -> bool {
        let mut state = self.state.write().await;
        let removed = state
            .connections
            .get_mut(&connection)
            .map(|entry| entry.rooms.remove(&user))
            .unwrap_or(false);

        if !removed {
            return false;
        }
        state.detach(connection, user);

        info!(connection_id = %connection, user_id = %user, "连接离开用户房间");
        true
    }

    pub async fn is_member(&self, connection: ConnectionId, user: UserId) -> bool {
        let state = self.state.read().await;
        state
            .connections
            .get(&connection)
            .map(|entry| entry.rooms.contains(&user))
            .unwrap_or(false)
    }

    /// 向房间内所有连接推送事件，返回成功入队的连接数。空房间直接返回 0。
    pub async fn broadcast_to(&self, user: UserId, event: SocketEvent, payload: JsonValue) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(&user) else {
            debug!(user_id = %user, event = %event, "房间无连接，跳过推送");
            return 0;
        };

        let mut delivered = 0;
        for connection in members {
            let Some(entry) = state.connections.get(connection) else {
                continue;
            };
            match entry.sender.send(ServerEvent::new(event, payload.clone())) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    debug!(connection_id = %connection, event = %event, "连接出站队列已关闭");
                }
            }
        }

        debug!(user_id = %user, event = %event, delivered, "推送完成");
        delivered
    }

    pub async fn room_size(&self, user: UserId) -> usize {
        let state = self.state.read().await;
        state.rooms.get(&user).map(HashSet::len).unwrap_or(0)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}
