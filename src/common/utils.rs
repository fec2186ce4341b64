use std::hash::{DefaultHasher, Hash, Hasher};

use crate::allocator::MAX_MACHINE_ID;

/// 获取当前机器的主机名
///
/// 用于生成默认的 `run_on` 字段。
pub fn get_hostname() -> String {
    hostname::get()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

/// 由主机名推导默认机器号
///
/// 只是兜底值：多节点部署时请显式配置 `NodeConfig::machine_id`。
pub fn default_machine_id(host_name: &str) -> u16 {
    let mut hasher = DefaultHasher::new();
    host_name.hash(&mut hasher);
    (hasher.finish() % (MAX_MACHINE_ID as u64 + 1)) as u16
}
