//! 单元测试用的存储与分配器桩

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{CoordinationStore, MemoryStore};
use crate::allocator::IdAllocator;
use crate::common::error::{Result, SchedulerError};

/// 记录下来的一次存储调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreOp {
    Put { key: String, value: String },
    Delete { key: String },
}

/// 记录所有写操作的存储，可以按需注入失败
#[derive(Debug, Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    ops: Mutex<Vec<StoreOp>>,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    /// 所有 Put 的值，按写入顺序反序列化
    pub(crate) fn put_values(&self) -> Vec<serde_json::Value> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Put { value, .. } => serde_json::from_str(&value).ok(),
                StoreOp::Delete { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl CoordinationStore for RecordingStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.ops.lock().push(StoreOp::Put {
            key: key.to_string(),
            value: value.to_string(),
        });
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(SchedulerError::Store("injected put failure".into()));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        self.ops.lock().push(StoreOp::Delete {
            key: key.to_string(),
        });
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(SchedulerError::Store("injected delete failure".into()));
        }
        self.inner.delete(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        self.inner.scan_prefix(prefix).await
    }
}

/// 固定返回同一个结果的分配器
#[derive(Debug)]
pub(crate) struct FixedAllocator(pub(crate) Option<u64>);

#[async_trait]
impl IdAllocator for FixedAllocator {
    async fn next_id(&self) -> Result<u64> {
        self.0
            .ok_or_else(|| SchedulerError::IdAllocation("allocator unreachable".into()))
    }
}
