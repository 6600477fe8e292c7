use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
///
/// 除 `Internal` 外均属于客户端输入问题（400）；`validate` 接口不走这里，
/// 它把“不是合法 Base64”当作正常的校验结果返回。
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 缺少 `file` 字段，或文件名 / 内容为空
    #[error("no file sent")]
    NoFileSent,

    /// 扩展名不在允许列表中
    #[error("unsupported file type, allowed types: {allowed}")]
    UnsupportedFileType {
        /// 允许的扩展名（逗号分隔）
        allowed: String,
    },

    /// 文件超过大小上限
    #[error("file too large, maximum size is {limit_mb} MB")]
    FileTooLarge {
        /// 上限（MB）
        limit_mb: u64,
    },

    /// 请求体中没有 `base64Data`
    #[error("no base64 data provided")]
    NoBase64Data,

    /// Base64 字母表或填充非法
    #[error("invalid base64 format")]
    InvalidBase64,

    /// 请求体无法解析（非 JSON、multipart 流损坏、头部值非法等）
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误响应体：`{ error, details?, requestId? }`
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// 面向调用方的错误信息
    #[schema(example = "invalid base64 format")]
    pub error: String,

    /// 可选：诊断细节（仅 400 的请求体问题与 500 携带）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// 可选：请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// 对外暴露的错误信息。内部错误只给通用文案，细节放到 `details`。
    pub(crate) fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(_) => "invalid request".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::BadRequest(d) | AppError::Internal(d) => Some(d.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", self);
        }

        let body = ErrorBody {
            error: self.public_message(),
            details: self.details(),
            request_id: crate::request_id::current_request_id(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("编解码任务执行失败: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::{http::StatusCode, response::IntoResponse};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("parse json"))
    }

    #[tokio::test]
    async fn client_errors_are_bad_request_without_details() {
        let (status, v) = body_json(AppError::InvalidBase64).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "invalid base64 format");
        assert!(v.get("details").is_none());
    }

    #[tokio::test]
    async fn internal_error_hides_detail_behind_generic_message() {
        let (status, v) = body_json(AppError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"], "internal server error");
        assert_eq!(v["details"], "disk on fire");
    }

    #[test]
    fn size_and_type_messages_name_the_limits() {
        let too_large = AppError::FileTooLarge { limit_mb: 10 }.to_string();
        assert!(too_large.contains("10 MB"));

        let unsupported = AppError::UnsupportedFileType {
            allowed: "png, jpg".into(),
        }
        .to_string();
        assert!(unsupported.contains("png, jpg"));
    }
}
