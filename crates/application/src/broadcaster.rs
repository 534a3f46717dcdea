//! 发往客户端的出站事件

use domain::SocketEvent;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

/// 一次出站推送：`{"event": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub event: SocketEvent,
    pub data: JsonValue,
}

impl ServerEvent {
    pub fn new(event: SocketEvent, data: JsonValue) -> Self {
        Self { event, data }
    }
}

/// 每个连接的出站队列；传输层持有接收端
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;
