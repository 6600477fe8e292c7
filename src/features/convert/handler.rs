//! Base64 转换接口（features/convert）
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};

use crate::error::AppError;
use crate::state::AppState;

use super::{
    codec::{self, format_bytes},
    limits::ConversionLimits,
    models::{
        DEFAULT_DECODE_FILE_NAME, DEFAULT_DECODE_MIME_TYPE, DEFAULT_UPLOAD_FILE_NAME,
        DecodeRequest, EncodeResponse, UploadedFile, ValidateRequest, ValidateResponse,
    },
    naming::{resolve_mime_type, sanitize_file_name},
};

/// 超过该字节数的编解码移出 tokio worker 执行
const OFFLOAD_THRESHOLD: usize = 64 * 1024;

/// 执行 CPU 密集的编解码。小数据直接在当前任务里算，大数据交给阻塞线程池。
async fn run_codec<T, F>(input_len: usize, f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if input_len < OFFLOAD_THRESHOLD {
        return Ok(f());
    }
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// 从 multipart 中读取 `file` 字段；其余字段忽略。
///
/// 扩展名在读取内容前校验，大小边读边校验，超限立即中止。
async fn read_upload(
    multipart: &mut Multipart,
    limits: &ConversionLimits,
) -> Result<Option<UploadedFile>, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("multipart 解析失败: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::trim).unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(AppError::NoFileSent);
        }
        if !limits.is_allowed_file_name(&file_name) {
            tracing::warn!(file_name = %file_name, "拒绝不支持的文件类型");
            return Err(AppError::UnsupportedFileType {
                allowed: limits.allowed_list(),
            });
        }
        let content_type = field.content_type().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(format!("读取上传内容失败: {e}")))?
        {
            let total = (data.len() + chunk.len()) as u64;
            if total > limits.max_file_size {
                tracing::warn!(
                    file_name = %file_name,
                    received = total,
                    max_file_size = limits.max_file_size,
                    "上传文件超过大小上限，已中止读取"
                );
                return Err(AppError::FileTooLarge {
                    limit_mb: limits.max_file_size_mb(),
                });
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(AppError::NoFileSent);
        }

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            data,
        }));
    }

    Ok(None)
}

#[utoipa::path(
    post,
    path = "/encode",
    summary = "图片编码为 Base64",
    description = "上传单个图片文件（multipart 字段 `file`），返回 Base64 文本、MIME、清洗后的文件名、大小以及 data URL。仅接受 png/jpg/jpeg/gif/bmp/webp，最大 10 MB。",
    request_body(
        content = super::models::EncodeForm,
        content_type = "multipart/form-data",
        description = "包含 `file` 字段的表单"
    ),
    responses(
        (status = 200, description = "编码成功", body = EncodeResponse),
        (status = 400, description = "未上传文件 / 类型不支持 / 超过大小上限", body = crate::error::ErrorBody),
        (status = 500, description = "服务器内部错误", body = crate::error::ErrorBody)
    ),
    tag = "Convert"
)]
pub async fn encode_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EncodeResponse>, AppError> {
    // 非 multipart 请求等同于“没有上传文件”
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("encode 请求不是合法的 multipart: {}", e.body_text());
        AppError::NoFileSent
    })?;

    let upload = read_upload(&mut multipart, &state.limits)
        .await?
        .ok_or(AppError::NoFileSent)?;

    let size = upload.data.len() as u64;
    let mime_type = resolve_mime_type(upload.content_type.as_deref(), &upload.file_name);
    let file_name = sanitize_file_name(&upload.file_name)
        .unwrap_or_else(|| DEFAULT_UPLOAD_FILE_NAME.to_string());

    let data = upload.data;
    let base64 = run_codec(data.len(), move || codec::encode(&data)).await?;

    tracing::info!(
        file_name = %file_name,
        size,
        mime_type = %mime_type,
        "图片已编码为 Base64"
    );

    Ok(Json(EncodeResponse {
        data_url: codec::data_url(&mime_type, &base64),
        base64,
        mime_type,
        file_name,
        size,
        size_formatted: format_bytes(size),
    }))
}

#[utoipa::path(
    post,
    path = "/decode",
    summary = "Base64 解码为图片下载",
    description = "将 Base64 文本（可带 data URL 前缀）解码为二进制，以附件形式返回。`mimeType` 默认 image/png，`fileName` 默认 decoded_image.png。",
    request_body = DecodeRequest,
    responses(
        (status = 200, description = "解码成功，body 为原始字节（Content-Type 取自 mimeType，附带 Content-Disposition: attachment）"),
        (status = 400, description = "缺少 base64Data / Base64 格式非法 / 请求体无法解析", body = crate::error::ErrorBody),
        (status = 500, description = "服务器内部错误", body = crate::error::ErrorBody)
    ),
    tag = "Convert"
)]
pub async fn decode_image(
    State(state): State<AppState>,
    payload: Result<Json<DecodeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload.map_err(|e| json_rejection_to_error(e, &state.limits))?;

    let raw = req
        .base64_data
        .filter(|s| !s.is_empty())
        .ok_or(AppError::NoBase64Data)?;

    let mime_type = req
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DECODE_MIME_TYPE);
    let content_type = HeaderValue::from_str(mime_type)
        .map_err(|_| AppError::BadRequest(format!("mimeType 不是合法的头部值: {mime_type}")))?;

    let file_name = req
        .file_name
        .as_deref()
        .and_then(sanitize_file_name)
        .unwrap_or_else(|| DEFAULT_DECODE_FILE_NAME.to_string());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| AppError::Internal(format!("构造 Content-Disposition 失败: {e}")))?;

    let bytes = run_codec(raw.len(), move || codec::decode_payload(&raw))
        .await?
        .map_err(|e| {
            tracing::warn!("Base64 解码失败: {}", e);
            AppError::InvalidBase64
        })?;

    tracing::info!(
        file_name = %file_name,
        size = bytes.len(),
        mime_type = %mime_type,
        "Base64 已解码为文件"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok((StatusCode::OK, headers, Bytes::from(bytes)).into_response())
}

#[utoipa::path(
    post,
    path = "/validate",
    summary = "校验 Base64 文本",
    description = "判断文本（可带 data URL 前缀）是否为合法的标准 Base64。校验结果始终以 HTTP 200 返回，非法时 `isValid=false` 并附带 `error`。",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "校验完成（合法或非法）", body = ValidateResponse)
    ),
    tag = "Convert"
)]
pub async fn validate_base64(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Json<ValidateResponse> {
    // 请求体问题同样以 isValid=false 报告，文案与 decode 的错误一致
    let raw = match payload {
        Ok(Json(req)) => req.base64_data.filter(|s| !s.is_empty()),
        Err(e) => {
            let err = json_rejection_to_error(e, &state.limits);
            tracing::debug!("validate 请求体无法解析: {}", err);
            return Json(ValidateResponse::invalid(err.public_message()));
        }
    };
    let Some(raw) = raw else {
        return Json(ValidateResponse::invalid(AppError::NoBase64Data.to_string()));
    };

    let outcome = match run_codec(raw.len(), move || codec::decode_payload(&raw)).await {
        Ok(Ok(bytes)) => ValidateResponse::valid(bytes.len() as u64),
        Ok(Err(e)) => {
            tracing::debug!("Base64 校验未通过: {}", e);
            ValidateResponse::invalid(AppError::InvalidBase64.to_string())
        }
        // 校验本身没能跑完，依旧以“非法”结果返回
        Err(e) => {
            tracing::error!("Base64 校验任务失败: {}", e);
            ValidateResponse::invalid(e.public_message())
        }
    };
    Json(outcome)
}

/// JSON 提取失败：请求体过大视为超过上限，其余视为请求体无法解析
fn json_rejection_to_error(rejection: JsonRejection, limits: &ConversionLimits) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::FileTooLarge {
            limit_mb: limits.max_file_size_mb(),
        };
    }
    AppError::BadRequest(rejection.body_text())
}

pub fn create_convert_router() -> Router<AppState> {
    Router::new()
        .route("/encode", post(encode_image))
        .route("/decode", post(decode_image))
        .route("/validate", post(validate_base64))
}
