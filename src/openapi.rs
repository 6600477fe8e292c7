use utoipa::OpenApi;
use utoipa::openapi::server::ServerBuilder;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::convert::handler::encode_image,
        crate::features::convert::handler::decode_image,
        crate::features::convert::handler::validate_base64,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::features::health::HealthResponse,
            crate::features::convert::models::EncodeForm,
            crate::features::convert::EncodeResponse,
            crate::features::convert::DecodeRequest,
            crate::features::convert::ValidateRequest,
            crate::features::convert::ValidateResponse,
        )
    ),
    tags(
        (
            name = "Convert",
            description = "图片与 Base64 互转：上传编码、解码下载、格式校验。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Image Base64 API",
        version = env!("CARGO_PKG_VERSION"),
        description = "图片与 Base64 文本互转服务（Axum + utoipa）。业务接口挂载在 `config.api.prefix` 下（默认为空，即根路径），OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;

/// 生成带正确 Servers 配置的 OpenAPI 文档。
///
/// 业务接口的实际前缀来自运行时配置，无法写进 derive 宏，这里在构建路由时注入；
/// `/health` 始终不带前缀，所以前缀非空时额外提供 `/` 作为备用 server。
pub fn build_openapi(api_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut servers = Vec::new();
    if !api_prefix.is_empty() {
        servers.push(
            ServerBuilder::new()
                .url(api_prefix)
                .description(Some("业务接口"))
                .build(),
        );
    }
    servers.push(
        ServerBuilder::new()
            .url("/")
            .description(Some("根路径"))
            .build(),
    );
    doc.servers = Some(servers);
    doc
}

#[cfg(test)]
mod tests {
    use super::build_openapi;

    #[test]
    fn openapi_lists_all_routes() {
        let doc = build_openapi("");
        for path in ["/encode", "/decode", "/validate", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn openapi_servers_follow_prefix() {
        let doc = build_openapi("/api/base64");
        let urls: Vec<_> = doc
            .servers
            .expect("servers")
            .into_iter()
            .map(|s| s.url)
            .collect();
        assert_eq!(urls, vec!["/api/base64".to_string(), "/".to_string()]);
    }
}
