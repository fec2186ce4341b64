use async_trait::async_trait;
use std::sync::Arc;

use crate::common::error::Result;

// ==========================================
// 任务 ID 分配器接口 (IdAllocator)
// ==========================================

/// 集群级唯一 ID 分配器
///
/// **职责**: 为每一次任务执行分配一个在整个调度系统生命周期内唯一的 `u64`。
/// **约束**:
/// - 必须支持多个 Task / 多个节点并发调用，实现层自己负责同步。
/// - `0` 是保留值 (表示“未分配”)，实现不得返回 0。
#[async_trait]
pub trait IdAllocator: Send + Sync + 'static {
    /// 分配下一个 ID
    async fn next_id(&self) -> Result<u64>;
}

// 让 Arc<A> 自动实现 IdAllocator
#[async_trait]
impl<A> IdAllocator for Arc<A>
where
    A: IdAllocator + ?Sized,
{
    async fn next_id(&self) -> Result<u64> {
        (**self).next_id().await
    }
}
