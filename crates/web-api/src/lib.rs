//! Web API 层。
//!
//! 提供 Axum 路由：`/mewbook` WebSocket 事件通道与 `/attachments/{key}` 附件直出，
//! 把入站帧委托给应用层的事件路由。

mod error;
mod frame;
mod routes;
mod state;
mod ws_connection;

pub use error::ApiError;
pub use frame::{AckFrame, ClientFrame};
pub use routes::router;
pub use state::{AppState, StateDependencies};
