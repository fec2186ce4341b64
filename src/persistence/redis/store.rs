use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};

use super::core::{RedisStore, escape_glob};
use crate::common::error::Result;
use crate::persistence::traits::CoordinationStore;

#[async_trait]
impl CoordinationStore for RedisStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.timed(key, self.set_raw(key, value)).await
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        self.timed(key, self.del_raw(key)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.timed(key, self.get_raw(key)).await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        self.timed(prefix, self.scan_raw(prefix)).await
    }
}

// --- 不带超时的原始操作 ---
impl RedisStore {
    async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn del_raw(&self, key: &str) -> Result<u64> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn scan_raw(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut conn = self.pool.get().await?;
        let pattern = escape_glob(prefix);

        // 1. 游标遍历，收集所有匹配的 Key
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_batch_size)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        if keys.is_empty() {
            return Ok(vec![]);
        }
        // SCAN 可能返回重复 Key
        keys.sort();
        keys.dedup();

        // 2. MGET 批量取值，避免 N+1 次网络调用
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        // 扫描和读取之间被删除的 Key 直接跳过
        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }
}
