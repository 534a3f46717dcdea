use std::str::FromStr;

use application::ServerEvent;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ConnectionId, SocketEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::frame::{AckFrame, ClientFrame};
use crate::state::AppState;

/// 单个 WebSocket 连接
///
/// 负责：
/// - 向在线注册表登记出站通道
/// - 按到达顺序逐帧分派入站事件
/// - 断开时从所有用户房间移除
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    connection_id: ConnectionId,
}

/// 写入 socket 的命令
enum WsCommand {
    SendText(String),
    SendPong(Vec<u8>),
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState) -> Self {
        let connection_id = ConnectionId::new();
        tracing::info!(connection_id = %connection_id, "WebSocket 连接已建立");
        Self {
            socket,
            state,
            connection_id,
        }
    }

    pub async fn run(self) {
        let Self {
            socket,
            state,
            connection_id,
        } = self;

        let (mut sender, mut incoming) = socket.split();

        // 房间推送通道，登记后即可收到 broadcast_to 的事件
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
        state.presence.register(connection_id, event_tx).await;

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        // 发送任务：所有对 sender 的写操作都集中在这里
        let mut send_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(cmd) = cmd_rx.recv() => {
                        let message = match cmd {
                            WsCommand::SendText(text) => WsMessage::Text(text.into()),
                            WsCommand::SendPong(data) => WsMessage::Pong(data.into()),
                        };
                        if sender.send(message).await.is_err() {
                            tracing::warn!("Failed to send websocket frame");
                            break;
                        }
                    }
                    Some(event) = event_rx.recv() => {
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(err) => {
                                tracing::error!(error = %err, event = %event.event, "推送事件序列化失败");
                                continue;
                            }
                        };
                        if sender.send(WsMessage::Text(text.into())).await.is_err() {
                            tracing::warn!("Failed to push event");
                            break;
                        }
                    }
                    else => break,
                }
            }
        });

        // 接收任务：顺序处理，同一连接的事件不会交错
        let mut recv_task = {
            let state = state.clone();
            tokio::spawn(async move {
                while let Some(message) = incoming.next().await {
                    match message {
                        Ok(WsMessage::Text(text)) => {
                            Self::handle_text(&state, connection_id, text.as_str(), &cmd_tx).await;
                        }
                        Ok(WsMessage::Ping(data)) => {
                            if cmd_tx.send(WsCommand::SendPong(data.to_vec())).await.is_err() {
                                break;
                            }
                        }
                        Ok(WsMessage::Close(_)) => break,
                        Ok(WsMessage::Binary(_)) => {
                            tracing::debug!(connection_id = %connection_id, "忽略二进制帧");
                        }
                        Ok(WsMessage::Pong(_)) => {}
                        Err(err) => {
                            tracing::warn!(connection_id = %connection_id, error = %err, "WebSocket 读取失败");
                            break;
                        }
                    }
                }
            })
        };

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        // 断开时静默离开所有房间，不向好友推送下线
        let rooms = state.presence.unregister(connection_id).await;
        tracing::info!(connection_id = %connection_id, rooms = rooms.len(), "WebSocket 连接已断开");
    }

    async fn handle_text(
        state: &AppState,
        connection_id: ConnectionId,
        text: &str,
        cmd_tx: &mpsc::Sender<WsCommand>,
    ) {
        let frame: ClientFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(connection_id = %connection_id, error = %err, "无法解析的入站帧");
                return;
            }
        };

        let event = match SocketEvent::from_str(&frame.event) {
            Ok(event) => event,
            Err(_) => {
                tracing::warn!(connection_id = %connection_id, event = %frame.event, "未知事件，忽略");
                return;
            }
        };

        tracing::debug!(connection_id = %connection_id, event = %event, "收到事件");
        let reply = state.router.dispatch(connection_id, event, frame.data).await;

        let (Some(ack), Some(data)) = (frame.ack, reply) else {
            return;
        };
        match serde_json::to_string(&AckFrame::new(ack, data)) {
            Ok(text) => {
                if cmd_tx.send(WsCommand::SendText(text)).await.is_err() {
                    tracing::warn!(connection_id = %connection_id, "确认发送失败，连接已关闭");
                }
            }
            Err(err) => tracing::error!(error = %err, "确认序列化失败"),
        }
    }
}
