// ==========================================
// 实验跟踪流水线 - HTTP 服务主入口
// ==========================================
// 启动顺序: 配置 → 日志 → AppState (建表) → 路由 → 监听
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use ml_tracking::app::{build_router, AppState};
use ml_tracking::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("加载配置失败")?;

    // 初始化日志系统
    ml_tracking::logging::init(config.debug, config.log_json);

    tracing::info!("==================================================");
    tracing::info!("{} - 评分服务", ml_tracking::APP_NAME);
    tracing::info!("系统版本: {}", ml_tracking::VERSION);
    tracing::info!("==================================================");

    let state = Arc::new(AppState::new(&config).map_err(anyhow::Error::msg)?);
    let prefix = config.route_prefix();
    let app = build_router(state, &prefix);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;
    tracing::info!(addr = %addr, prefix = %prefix, "服务已启动");

    axum::serve(listener, app).await.context("服务异常退出")?;
    Ok(())
}
