use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// 全局统一的时间工具
pub struct TimeUtils;

impl TimeUtils {
    /// [标准] 获取当前 UTC 时间
    /// 全系统统一使用这个方法获取“现在”，方便未来 Mock 或做时钟偏移
    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// 获取当前 Unix 时间戳 (毫秒)
    ///
    /// 系统时钟早于 1970 时返回 0。
    pub fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
