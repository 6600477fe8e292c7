use super::naming::extension_of;

/// 允许上传的图片扩展名（小写）
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// 单个上传文件的字节上限：10 MiB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// multipart 边界、头部等额外开销的余量
const REQUEST_OVERHEAD: u64 = 1024 * 1024;

/// 转换接口的固定限制，启动时构建一次，经由 `AppState` 注入处理器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionLimits {
    /// 扩展名白名单（小写，不含点）
    pub allowed_extensions: &'static [&'static str],
    /// 单文件字节上限
    pub max_file_size: u64,
}

impl Default for ConversionLimits {
    fn default() -> Self {
        Self {
            allowed_extensions: ALLOWED_EXTENSIONS,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl ConversionLimits {
    /// 文件名的扩展名（大小写不敏感）是否在白名单内
    pub fn is_allowed_file_name(&self, file_name: &str) -> bool {
        extension_of(file_name).is_some_and(|ext| {
            self.allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }

    /// 用于错误提示的白名单文本，如 `png, jpg, jpeg`
    pub fn allowed_list(&self) -> String {
        self.allowed_extensions.join(", ")
    }

    /// 上限换算成 MB（向上取整），用于错误提示
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size.div_ceil(1024 * 1024)
    }

    /// 请求体上限。
    ///
    /// 需要同时容纳：上限大小的 multipart 上传，以及上限大小图片的 Base64 文本（约 4/3 倍）
    /// 作为 decode/validate 的 JSON 请求体。
    pub fn body_limit(&self) -> usize {
        let base64_len = self.max_file_size.div_ceil(3) * 4;
        usize::try_from(base64_len + REQUEST_OVERHEAD).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        let limits = ConversionLimits::default();
        assert!(limits.is_allowed_file_name("photo.PNG"));
        assert!(limits.is_allowed_file_name("a.b.JpEg"));
        assert!(limits.is_allowed_file_name("dir/sub/pic.webp"));
    }

    #[test]
    fn extension_check_rejects_other_types() {
        let limits = ConversionLimits::default();
        assert!(!limits.is_allowed_file_name("doc.pdf"));
        assert!(!limits.is_allowed_file_name("png"));
        assert!(!limits.is_allowed_file_name("photo."));
        assert!(!limits.is_allowed_file_name("photo.png.exe"));
    }

    #[test]
    fn limit_texts() {
        let limits = ConversionLimits::default();
        assert_eq!(limits.allowed_list(), "png, jpg, jpeg, gif, bmp, webp");
        assert_eq!(limits.max_file_size_mb(), 10);
    }

    #[test]
    fn body_limit_fits_base64_of_max_file() {
        let limits = ConversionLimits::default();
        let max_base64 = (MAX_FILE_SIZE as usize).div_ceil(3) * 4;
        assert!(limits.body_limit() > max_base64);
        assert!(limits.body_limit() > MAX_FILE_SIZE as usize);
    }
}
