use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

use super::IdAllocator;
use crate::common::config::CronConfig;
use crate::common::error::{Result, SchedulerError};
use crate::persistence::RedisStore;

/// 基于 Redis `INCR` 的分配器
///
/// 所有节点共用同一个计数器 Key，Redis 单线程执行保证全局唯一、严格递增。
/// 计数器从 1 开始，天然跳过保留值 0。
#[derive(Clone)]
pub struct RedisIdAllocator {
    store: RedisStore,
    /// e.g. "talos" -> "talos:task_id"
    counter_key: String,
}

impl std::fmt::Debug for RedisIdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisIdAllocator")
            .field("counter_key", &self.counter_key)
            .finish()
    }
}

impl RedisIdAllocator {
    /// 与结果存储共用连接池
    pub fn from_store(config: &CronConfig, store: &RedisStore) -> Self {
        Self {
            store: store.clone(),
            counter_key: counter_key(&config.namespace),
        }
    }

    /// 计数器 Key
    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    async fn incr(&self) -> Result<u64> {
        let mut conn = self.store.pool.get().await?;
        let id: u64 = conn.incr(&self.counter_key, 1u64).await?;
        Ok(id)
    }
}

fn counter_key(namespace: &str) -> String {
    format!("{}:task_id", namespace)
}

#[async_trait]
impl IdAllocator for RedisIdAllocator {
    async fn next_id(&self) -> Result<u64> {
        let key = self.counter_key.as_str();
        let id = self
            .store
            .timed(key, self.incr())
            .await
            // 连接、超时等失败统一归类为分配失败
            .map_err(|e| SchedulerError::IdAllocation(e.to_string()))?;

        if id == 0 {
            return Err(SchedulerError::IdAllocation(format!(
                "counter {} returned reserved id 0",
                key
            )));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_key_is_namespaced() {
        assert_eq!(counter_key("talos"), "talos:task_id");
    }
}
