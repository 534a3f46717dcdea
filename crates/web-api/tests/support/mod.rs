use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use application::SystemClock;
use async_trait::async_trait;
use domain::{BlobStore, BlobStoreError, BlobStoreResult, BlobVariant, UserId};
use futures_util::{SinkExt, StreamExt};
use infrastructure::{JsonFileAttachmentStore, MemoryFriendRepository, MemoryNotificationRepository};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use web_api::{router, AppState, StateDependencies};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 远程附件存储替身：按 file_id 返回预置字节，并记录下载次数
#[derive(Default)]
pub struct FakeBlobStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    downloads: Mutex<usize>,
}

impl FakeBlobStore {
    pub async fn put(&self, file_id: &str, bytes: Vec<u8>) {
        self.files.lock().await.insert(file_id.to_string(), bytes);
    }

    pub async fn downloads(&self) -> usize {
        *self.downloads.lock().await
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(&self, file_name: String, bytes: Vec<u8>) -> BlobStoreResult<Vec<BlobVariant>> {
        let size = bytes.len() as u64;
        self.files.lock().await.insert(file_name.clone(), bytes);
        Ok(vec![
            BlobVariant { file_id: format!("{file_name}-s"), file_size: size / 4 },
            BlobVariant { file_id: format!("{file_name}-l"), file_size: size },
        ])
    }

    async fn download(&self, file_id: String) -> BlobStoreResult<Vec<u8>> {
        *self.downloads.lock().await += 1;
        self.files
            .lock()
            .await
            .get(&file_id)
            .cloned()
            .ok_or(BlobStoreError::NotFound(file_id))
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub notifications: MemoryNotificationRepository,
    pub friends: MemoryFriendRepository,
    pub blobs: Arc<FakeBlobStore>,
    _cache_dir: tempfile::TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let attachment_store = JsonFileAttachmentStore::open(cache_dir.path().join("attachments.json"))
            .await
            .expect("open attachment cache");

        let notifications = MemoryNotificationRepository::new();
        let friends = MemoryFriendRepository::new();
        let blobs = Arc::new(FakeBlobStore::default());

        let state = AppState::new(StateDependencies {
            notification_repository: Arc::new(notifications.clone()),
            friend_repository: Arc::new(friends.clone()),
            attachment_store: Arc::new(attachment_store),
            blob_store: blobs.clone(),
            clock: Arc::new(SystemClock),
            max_frame_bytes: 1024 * 1024,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = router(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server");
        });

        Self {
            addr,
            state,
            notifications,
            friends,
            blobs,
            _cache_dir: cache_dir,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> Client {
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{}/mewbook", self.addr))
            .await
            .expect("connect websocket");
        client
    }

    /// 等待用户房间达到预期人数，避免与服务端处理顺序竞争
    pub async fn wait_room_size(&self, user: i64, expected: usize) {
        let presence = self.state.presence.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while presence.room_size(UserId::new(user)).await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("room size not reached");
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

pub async fn emit(client: &mut Client, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data});
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

pub async fn emit_with_ack(client: &mut Client, event: &str, data: Value, ack: u64) {
    let frame = json!({"event": event, "data": data, "ack": ack});
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// 读取下一帧文本并解析为 JSON
pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream closed")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

/// 短时间内不应再收到任何文本帧
pub async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = result {
        panic!("unexpected frame: {text}");
    }
}
