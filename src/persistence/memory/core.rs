use dashmap::DashMap;
use std::sync::Arc;

/// 内存协调存储 (In-Memory Store)
///
/// 单进程内的 `CoordinationStore` 实现，适合单节点部署、本地调试和测试。
/// - DashMap: 分片锁，高并发读写不排队
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key -> Value
    pub(super) data: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// 创建一个空的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Clone 实现：因为内部都是 Arc，所以 Clone 是廉价的，克隆体共享同一份数据
impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}
