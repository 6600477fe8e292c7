//! 文件名清洗与 MIME 类型推断

/// 无法推断类型时的兜底 MIME
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Windows 保留设备名，落盘时会被系统特殊处理
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 取路径的最后一段（`/` 与 `\` 都视为分隔符）
fn last_component(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// 文件名最后一个 `.` 之后的部分；没有扩展名或扩展名为空时返回 None
pub fn extension_of(file_name: &str) -> Option<&str> {
    let (_, ext) = last_component(file_name).rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

/// 清洗调用方提供的文件名，使其可安全用于文件系统路径与 HTTP 头。
///
/// - 丢弃目录部分
/// - 连续空白折叠为 `_`
/// - 仅保留 ASCII 字母、数字以及 `_` `.` `-`
/// - 去掉首尾的 `.` 和 `_`，结果不可能是 `.`/`..` 或隐藏文件
/// - Windows 设备名加 `_` 前缀
///
/// 清洗后为空则返回 None，由调用方决定默认名。
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = last_component(raw);

    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return None;
    }

    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|d| d.eq_ignore_ascii_case(stem))
    {
        return Some(format!("_{trimmed}"));
    }

    Some(trimmed.to_string())
}

/// 解析 MIME：优先使用上传时声明的类型，其次按扩展名推断，最后兜底为 octet-stream
pub fn resolve_mime_type(declared: Option<&str>, file_name: &str) -> String {
    if let Some(declared) = declared.map(str::trim)
        && !declared.is_empty()
    {
        return declared.to_string();
    }

    mime_guess::from_path(last_component(file_name))
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string()
}
