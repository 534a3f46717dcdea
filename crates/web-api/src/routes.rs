use application::sniff_image_type;
use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/mewbook", get(websocket_handler))
        .route("/attachments/{key}", get(get_attachment))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_frame_bytes = state.max_frame_bytes;
    ws.max_message_size(max_frame_bytes)
        .max_frame_size(max_frame_bytes)
        .on_upgrade(move |socket| WebSocketConnection::new(socket, state).run())
}

/// 直接返回附件原始字节，Content-Type 按文件头识别
async fn get_attachment(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.attachments.resolve_bytes(&key).await.map_err(|err| {
        tracing::warn!(attachment = %key, error = %err, "附件获取失败");
        ApiError::from(err)
    })?;

    let mime = sniff_image_type(&bytes).mime();
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
