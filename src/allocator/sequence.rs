use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use super::IdAllocator;
use crate::common::error::{Result, SchedulerError};

/// 进程内自增分配器
///
/// 只保证单进程内唯一，适合单节点部署和测试。
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    /// 从 1 开始分配
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// 从指定值开始分配 (传入 0 时按 1 处理)
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdAllocator for SequenceAllocator {
    async fn next_id(&self) -> Result<u64> {
        // 计数器为 0 表示序列已耗尽，之后保持为 0，不会绕回
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| match id {
                0 => None,
                id => Some(id.checked_add(1).unwrap_or(0)),
            })
            .map_err(|_| SchedulerError::IdAllocation("sequence exhausted".into()))
    }
}
