use serde::{Deserialize, Serialize};

/// decode 未指定 mimeType 时的默认值
pub const DEFAULT_DECODE_MIME_TYPE: &str = "image/png";
/// decode 未指定（或清洗后为空的）fileName 时的默认值
pub const DEFAULT_DECODE_FILE_NAME: &str = "decoded_image.png";
/// encode 上传文件名清洗后为空时的回退值
pub const DEFAULT_UPLOAD_FILE_NAME: &str = "upload";

/// 一次请求内读取到的上传文件
#[derive(Debug)]
pub struct UploadedFile {
    /// 客户端声明的原始文件名（未清洗）
    pub file_name: String,
    /// multipart 分段声明的 Content-Type
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// encode 的 multipart 表单（仅用于 OpenAPI 文档）
#[derive(Debug, utoipa::ToSchema)]
pub struct EncodeForm {
    /// 图片文件（png/jpg/jpeg/gif/bmp/webp，最大 10 MB）
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// encode 响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
  "base64": "iVBORw0KGgo=",
  "mimeType": "image/png",
  "fileName": "photo.png",
  "size": 8,
  "sizeFormatted": "8.0 B",
  "dataUrl": "data:image/png;base64,iVBORw0KGgo="
}))]
pub struct EncodeResponse {
    pub base64: String,
    pub mime_type: String,
    /// 清洗后的文件名
    pub file_name: String,
    /// 原始字节数
    pub size: u64,
    pub size_formatted: String,
    pub data_url: String,
}

/// decode 请求
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    /// Base64 文本，可带 `data:<mime>;base64,` 前缀
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub base64_data: Option<String>,
    /// 响应 Content-Type（默认 image/png）
    #[serde(default)]
    pub mime_type: Option<String>,
    /// 下载文件名（默认 decoded_image.png）
    #[serde(default)]
    pub file_name: Option<String>,
}

/// validate 请求
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// Base64 文本，可带 `data:<mime>;base64,` 前缀
    pub base64_data: Option<String>,
}

/// validate 响应：无论合法与否 HTTP 状态都是 200
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub is_valid: bool,
    /// 解码后的字节数（仅合法时）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_formatted: Option<String>,
    /// 失败原因（仅非法时）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    pub fn valid(size: u64) -> Self {
        Self {
            is_valid: true,
            size: Some(size),
            size_formatted: Some(super::codec::format_bytes(size)),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            size: None,
            size_formatted: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_request_reads_camel_case_and_tolerates_missing_fields() {
        let req: DecodeRequest =
            serde_json::from_str(r#"{"base64Data":"AAAA","fileName":"x.png"}"#).expect("parse");
        assert_eq!(req.base64_data.as_deref(), Some("AAAA"));
        assert_eq!(req.file_name.as_deref(), Some("x.png"));
        assert!(req.mime_type.is_none());

        let empty: DecodeRequest = serde_json::from_str("{}").expect("parse");
        assert!(empty.base64_data.is_none());
    }

    #[test]
    fn validate_response_shapes() {
        let ok = serde_json::to_value(ValidateResponse::valid(1536)).expect("json");
        assert_eq!(
            ok,
            serde_json::json!({"isValid": true, "size": 1536, "sizeFormatted": "1.5 KB"})
        );

        let bad = serde_json::to_value(ValidateResponse::invalid("invalid base64 format"))
            .expect("json");
        assert_eq!(
            bad,
            serde_json::json!({"isValid": false, "error": "invalid base64 format"})
        );
    }
}
