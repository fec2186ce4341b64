use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use std::future::Future;
use std::time::Duration;

use crate::common::config::CronConfig;
use crate::common::error::{Result, SchedulerError};

/// Redis 协调存储实现
///
/// 包含 Redis 连接池。Key 原样写入，不追加命名空间：
/// 结果 Key 的格式是对外契约，看板和其他节点直接按它查询。
#[derive(Clone)]
pub struct RedisStore {
    /// Redis 客户端 连接池
    pub(crate) pool: Pool,

    /// 单次操作超时
    pub(super) op_timeout: Duration,

    /// SCAN 每批数量提示
    pub(super) scan_batch_size: usize,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("op_timeout", &self.op_timeout)
            .field("scan_batch_size", &self.scan_batch_size)
            .finish()
    }
}

impl RedisStore {
    /// 创建新实例
    pub fn new(config: &CronConfig, url: &str) -> Result<Self> {
        let mut cfg = Config::from_url(url);
        cfg.pool = Some(PoolConfig::new(config.store.redis_pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| SchedulerError::Config(format!("create redis pool: {}", e)))?;

        Ok(Self::from_pool(config, pool))
    }

    /// 复用外部已经建好的连接池
    pub fn from_pool(config: &CronConfig, pool: Pool) -> Self {
        Self {
            pool,
            op_timeout: Duration::from_millis(config.store.op_timeout_ms),
            scan_batch_size: config.store.scan_batch_size.max(1),
        }
    }

    /// 给单次操作套上超时
    pub(crate) async fn timed<T, F>(&self, key: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(SchedulerError::StoreTimeout(key.to_string())),
        }
    }
}

/// 转义 SCAN MATCH 的 glob 元字符，保证前缀按字面匹配
pub(super) fn escape_glob(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('*');
    out
}
