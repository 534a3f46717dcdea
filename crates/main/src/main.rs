//! 主应用程序入口
//!
//! 读取配置，装配存储与附件适配器，启动 Axum 服务。

use std::sync::Arc;

use application::SystemClock;
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, StateDependencies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG 优先，否则按 debug 开关决定级别
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let infrastructure = Infrastructure::connect(&config).await?;

    let state = AppState::new(StateDependencies {
        notification_repository: infrastructure.notification_repository,
        friend_repository: infrastructure.friend_repository,
        attachment_store: infrastructure.attachment_store,
        blob_store: infrastructure.blob_store,
        clock: Arc::new(SystemClock),
        max_frame_bytes: config.server.max_frame_bytes,
    });

    let app = router(state);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(address = %address, "社交事件中继已启动，WebSocket 路径 /mewbook");
    axum::serve(listener, app).await?;

    Ok(())
}
