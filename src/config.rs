use config::{Config as ConfigBuilder, ConfigError, Environment, File, Map};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 业务路由前缀，空字符串表示直接挂在根路径下
    #[serde(default)]
    pub prefix: String,
}

/// CORS 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default)]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default)]
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
///
/// 上传大小上限与扩展名白名单不在这里：它们是编译期常量，
/// 见 [`crate::features::convert::ConversionLimits`]。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 加载配置：内置默认值 < config.toml（可选）< APP_* 环境变量 < PORT
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let mut config = Self::from_sources(Some(config_path), None)?;
        config.apply_port_override(std::env::var("PORT").ok().as_deref())?;

        tracing::debug!("配置加载完成: {:?}", config);
        Ok(config)
    }

    /// 按层级合并配置源。`env` 为 None 时读取进程环境变量。
    fn from_sources(
        file: Option<PathBuf>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&AppConfig::default())?);
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let mut config: Self = builder
            .add_source(env_source(env))
            .build()?
            .try_deserialize()?;
        config.api.prefix = normalize_prefix(&config.api.prefix);
        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 set_global()")
    }

    /// 以已加载好的配置初始化全局单例（只能设置一次）
    pub fn set_global(config: AppConfig) -> Result<(), ConfigError> {
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))
    }

    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 托管平台通常只注入 `PORT`，这里让它覆盖 server.port
    fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        let Some(raw) = port.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        self.server.port = raw
            .parse()
            .map_err(|_| ConfigError::Message(format!("PORT 不是合法端口: {raw}")))?;
        Ok(())
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 环境变量覆盖：段与字段之间用 `__` 分隔，字段名自身可含 `_`，
/// 例如 `APP_SERVER__PORT`、`APP_SHUTDOWN__TIMEOUT_SECS`。
/// CORS 列表项用逗号分隔：`APP_CORS__ALLOWED_ORIGINS=https://a.com,https://b.com`
fn env_source(source: Option<Map<String, String>>) -> Environment {
    CORS_LIST_KEYS
        .iter()
        .fold(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |env, &key| env.with_list_parse_key(key),
        )
        .source(source)
}

const CORS_LIST_KEYS: &[&str] = &[
    "cors.allowed_origins",
    "cors.allowed_methods",
    "cors.allowed_headers",
    "cors.expose_headers",
];

/// 规范化路由前缀：去掉首尾空白与末尾 `/`，非空时保证以 `/` 开头
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            api: ApiConfig {
                prefix: String::new(),
            },
            cors: CorsConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}
