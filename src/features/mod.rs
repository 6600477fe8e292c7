/// 图片与 Base64 互转
pub mod convert;

/// 健康检查
pub mod health;
