use std::future::IntoFuture;

use image_base64_backend::features::convert::ConversionLimits;
use image_base64_backend::{AppConfig, AppState, ShutdownManager, build_router};

fn init_tracing(level: &str) {
    let fallback = format!("image_base64_backend={level},tower_http={level}");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    // 日志级别来自配置，所以先加载配置再初始化日志；加载失败时按 info 级别输出错误。
    let loaded = AppConfig::load();
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    let config = match loaded.and_then(AppConfig::set_global) {
        Ok(()) => AppConfig::global(),
        Err(e) => {
            tracing::error!("Config init failed: {}", e);
            std::process::exit(1);
        }
    };

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let limits = ConversionLimits::default();
    tracing::info!(
        allowed = %limits.allowed_list(),
        max_file_size = limits.max_file_size,
        "转换限制已加载"
    );
    let app = build_router(config, AppState::new(limits));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    let prefix = &config.api.prefix;
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Encode API: http://{}{}/encode", addr, prefix);
    tracing::info!("Decode API: http://{}{}/decode", addr, prefix);
    tracing::info!("Validate API: http://{}{}/validate", addr, prefix);

    let drain_manager = shutdown_manager.clone();
    let shutdown_signal = async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .into_future();

    // 收到退出信号后，在途请求最多再等待 shutdown.timeout_secs
    let shutdown_timeout = config.shutdown.timeout_duration();
    let result = tokio::select! {
        res = server => res,
        _ = async {
            drain_manager.wait_for_shutdown().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!("优雅退出超时（{}秒），强制退出", config.shutdown.timeout_secs);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
