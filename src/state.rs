use std::sync::Arc;

use crate::features::convert::ConversionLimits;

/// 聚合的应用共享状态（只读，按请求克隆）
#[derive(Clone, Default)]
pub struct AppState {
    /// 上传类型白名单与大小上限
    pub limits: Arc<ConversionLimits>,
}

impl AppState {
    pub fn new(limits: ConversionLimits) -> Self {
        Self {
            limits: Arc::new(limits),
        }
    }
}
