use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{convert, health};
use crate::openapi::build_openapi;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 只压缩 JSON/文本类响应：decode 返回的图片与二进制下载本身已压缩或收益极低，
    // 压缩只会浪费 CPU。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
        .and(NotForContentType::const_new("video/"))
        .and(NotForContentType::const_new("audio/"))
}

/// 组装完整路由：业务接口、健康检查、文档以及全局中间件。
///
/// 业务接口挂在 `config.api.prefix` 下；前缀为空时直接合并到根路由。
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let body_limit = state.limits.body_limit();
    let api_router = convert::create_convert_router().layer(DefaultBodyLimit::max(body_limit));

    let prefix = config.api.prefix.as_str();
    let mut app = Router::<AppState>::new().route("/health", get(health::health_check));
    app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(prefix, api_router)
    };

    let mut app = app
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", build_openapi(prefix)))
        .with_state(state)
        .layer(CompressionLayer::new().compress_when(compression_predicate()));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // request_id 放在最外层，确保所有响应（含 CORS 预检）都带上 X-Request-Id
    app.layer(axum::middleware::from_fn(request_id_middleware))
}
