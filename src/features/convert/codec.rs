use std::borrow::Cow;

use base64::{DecodeError, Engine, prelude::BASE64_STANDARD};

/// 人类可读大小的单位序列，TB 之后不再进位
const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// 标准 Base64（RFC 4648 字母表，带填充）编码
pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// 去掉 data URL 前缀：存在逗号时丢弃第一个逗号及其之前的全部内容
pub fn strip_data_url_prefix(input: &str) -> &str {
    match input.find(',') {
        Some(idx) => &input[idx + 1..],
        None => input,
    }
}

/// 解码调用方提交的 Base64 文本。
///
/// 先去 data URL 前缀，再剔除 ASCII 空白（按行折断的 Base64 很常见），
/// 最后按标准字母表严格解码：非法字符、错误填充都会报错。
/// 末组多余的比特位必须为 0，`YR==` 这类非规范编码视为非法。
pub fn decode_payload(input: &str) -> Result<Vec<u8>, DecodeError> {
    let body = strip_data_url_prefix(input);
    let compact: Cow<'_, str> = if body.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(body.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(body)
    };
    BASE64_STANDARD.decode(compact.as_bytes())
}

/// 组装 data URL：`data:<mime>;base64,<data>`
pub fn data_url(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}

/// 字节数格式化：不小于 1024 时持续除以 1024 并进位单位，保留一位小数。
///
/// `1023 -> "1023.0 B"`，`1536 -> "1.5 KB"`，`1048576 -> "1.0 MB"`
pub fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn format_bytes_matches_reference_values() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(1023), "1023.0 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1.0 MB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn format_bytes_stops_at_terabytes() {
        assert_eq!(format_bytes(1024_u64.pow(4)), "1.0 TB");
        assert_eq!(format_bytes(2048 * 1024_u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn strip_prefix_cuts_at_first_comma() {
        assert_eq!(
            strip_data_url_prefix("data:image/png;base64,iVBORw0KGgo="),
            "iVBORw0KGgo="
        );
        assert_eq!(strip_data_url_prefix("abc"), "abc");
        assert_eq!(strip_data_url_prefix("a,b,c"), "b,c");
        assert_eq!(strip_data_url_prefix("trailing,"), "");
    }

    #[test]
    fn decode_accepts_data_url_and_line_breaks() {
        assert_eq!(
            decode_payload("data:image/png;base64,iVBORw0KGgo=").expect("valid"),
            PNG_SIGNATURE
        );
        assert_eq!(
            decode_payload("iVBO\r\nRw0K\nGgo=").expect("valid"),
            PNG_SIGNATURE
        );
    }

    #[test]
    fn decode_rejects_bad_alphabet_and_padding() {
        assert!(decode_payload("not-base64!!").is_err());
        assert!(decode_payload("iVBORw0KGgo").is_err());
        assert!(decode_payload("iVBORw0KGgo==").is_err());
        assert!(decode_payload("a,b,c").is_err());
    }

    #[test]
    fn decode_requires_zero_trailing_bits() {
        assert_eq!(decode_payload("YQ==").expect("canonical"), b"a");
        assert!(decode_payload("YR==").is_err());
        assert!(decode_payload("YWJ=").is_err());
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let samples: [&[u8]; 4] = [b"", b"x", PNG_SIGNATURE, &[0u8, 255, 128, 7, 9]];
        for bytes in samples {
            let text = encode(bytes);
            assert_eq!(decode_payload(&text).expect("roundtrip"), bytes);
            assert_eq!(
                decode_payload(&data_url("image/png", &text)).expect("roundtrip via data url"),
                bytes
            );
        }
    }
}
