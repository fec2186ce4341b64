use async_trait::async_trait;
use std::sync::Arc;

use crate::common::error::Result;

// ==========================================
// 协调存储接口 (CoordinationStore)
// ==========================================

/// 协调存储接口
///
/// **职责**: 集群共享的 KV 服务 (etcd / Redis 等)，用于发布任务执行结果，
/// 让任意节点或运维人员都能看到某次执行的状态。
/// **特点**:
/// - 写入是无条件覆盖 (Last-Write-Wins)，没有 CAS、没有版本校验。
/// - 超时与取消语义由实现层自己负责 (例如 Redis 实现的 `op_timeout_ms`)。
/// - Key 是类路径的层级字符串，例如 `/talos/cronjob/result/daily-report/42`。
#[async_trait]
pub trait CoordinationStore: Send + Sync + 'static {
    /// 写入 (Put)
    ///
    /// 如果 Key 已存在，则覆盖。
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// 删除 (Delete)
    ///
    /// 返回实际删除的条目数 (0 表示 Key 本来就不存在)。
    async fn delete(&self, key: &str) -> Result<u64>;

    /// 读取 (Get)
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 前缀扫描 (Scan)
    ///
    /// 返回所有以 `prefix` 开头的 `(key, value)`，按 Key 排序。
    /// 主要给看板和其他节点查询某个 Job 的历史执行结果用。
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;
}

// 让 Arc<S> 自动实现 CoordinationStore
#[async_trait]
impl<S> CoordinationStore for Arc<S>
where
    S: CoordinationStore + ?Sized,
{
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        (**self).delete(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        (**self).scan_prefix(prefix).await
    }
}
