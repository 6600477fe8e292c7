use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

use crate::config::CorsConfig;

/// 配置项解析结果：`*` 对应任意值，其余为逐项解析成功的值
#[derive(Debug, PartialEq)]
enum Allowed<T> {
    Any,
    List(Vec<T>),
}

impl<T> Allowed<T> {
    fn is_any(&self) -> bool {
        matches!(self, Allowed::Any)
    }

    fn is_empty(&self) -> bool {
        matches!(self, Allowed::List(v) if v.is_empty())
    }
}

/// 根据配置构建 CORS 中间件；未启用或配置无效时返回 None
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let origins = parse_list("allowed_origins", &cors.allowed_origins, |v| {
        HeaderValue::from_str(v).ok()
    });
    if origins.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    let methods = parse_list("allowed_methods", &cors.allowed_methods, |v| {
        Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
    });
    let headers = parse_list("allowed_headers", &cors.allowed_headers, parse_header_name);
    let expose = parse_list("expose_headers", &cors.expose_headers, parse_header_name);

    let any_used = origins.is_any() || methods.is_any() || headers.is_any() || expose.is_any();
    if cors.allow_credentials && any_used {
        tracing::error!("CORS 配置无效：allow_credentials=true 不能与 \"*\" 同时使用，已跳过启用");
        return None;
    }

    let mut layer = CorsLayer::new();

    layer = match origins {
        Allowed::Any => layer.allow_origin(Any),
        Allowed::List(v) => layer.allow_origin(AllowOrigin::list(v)),
    };
    match methods {
        Allowed::Any => layer = layer.allow_methods(Any),
        Allowed::List(v) if !v.is_empty() => layer = layer.allow_methods(AllowMethods::list(v)),
        Allowed::List(_) => {}
    }
    match headers {
        Allowed::Any => layer = layer.allow_headers(Any),
        Allowed::List(v) if !v.is_empty() => layer = layer.allow_headers(AllowHeaders::list(v)),
        Allowed::List(_) => {}
    }
    match expose {
        Allowed::Any => layer = layer.expose_headers(Any),
        Allowed::List(v) if !v.is_empty() => layer = layer.expose_headers(ExposeHeaders::list(v)),
        Allowed::List(_) => {}
    }

    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

fn parse_header_name(v: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(v.to_ascii_lowercase().as_bytes()).ok()
}

fn parse_list<T>(label: &str, values: &[String], parse: impl Fn(&str) -> Option<T>) -> Allowed<T> {
    let mut out = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            return Allowed::Any;
        }
        match parse(value) {
            Some(v) => out.push(v),
            None => tracing::warn!("CORS {} 含无效值: {}", label, value),
        }
    }
    Allowed::List(out)
}

#[cfg(test)]
mod tests {
    use super::{Allowed, build_cors_layer, parse_list};
    use crate::config::CorsConfig;
    use axum::http::Method;

    #[test]
    fn disabled_config_builds_nothing() {
        let cors = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn build_cors_layer_skips_when_origins_empty() {
        let cors = CorsConfig {
            enabled: true,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn build_cors_layer_rejects_credentials_with_wildcard() {
        let cors = CorsConfig {
            enabled: true,
            allow_credentials: true,
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn parse_list_normalizes_methods_and_drops_blanks() {
        let input = vec!["get".to_string(), " ".to_string(), " POST ".to_string()];
        let parsed = parse_list("allowed_methods", &input, |v| {
            Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
        });
        assert_eq!(parsed, Allowed::List(vec![Method::GET, Method::POST]));
    }

    #[test]
    fn parse_list_wildcard_wins() {
        let input = vec!["https://a.example".to_string(), "*".to_string()];
        let parsed = parse_list("allowed_origins", &input, |v| Some(v.to_string()));
        assert_eq!(parsed, Allowed::Any);
    }
}
