use serde::{Deserialize, Serialize};

use crate::common::error::{Result, SchedulerError};
use crate::common::utils::{default_machine_id, get_hostname};

// ==========================================
// 1. 节点配置 (NodeConfig)
// ==========================================

/// 当前执行节点的身份配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// 主机名
    ///
    /// - 说明: 写入执行记录的 `run_on` 字段，用于排查任务跑在哪台机器上。
    /// - 默认值: 系统主机名
    /// - 建议: 在 K8s 环境中可注入 Pod Name。
    pub host_name: String,

    /// 机器号 (0 ~ 1023)
    ///
    /// - 说明: Snowflake 分配器的机器位。集群内必须唯一，否则 TaskID 可能冲突。
    /// - 默认值: 由主机名哈希得到
    pub machine_id: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let host_name = get_hostname();
        let machine_id = default_machine_id(&host_name);
        Self {
            host_name,
            machine_id,
        }
    }
}

// ==========================================
// 2. 存储配置 (StoreConfig)
// ==========================================

/// 协调存储客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 单次存储操作超时 (毫秒)
    ///
    /// - 说明: `put` / `delete` / `get` 的最长等待时间，超时返回 `StoreTimeout`。
    /// - 默认值: 3000 ms
    pub op_timeout_ms: u64,

    /// Redis 连接池大小
    ///
    /// - 默认值: 核心数 * 2
    #[cfg(feature = "distributed")]
    pub redis_pool_size: usize,

    /// SCAN 每批返回的 Key 数量提示
    ///
    /// - 默认值: 200
    pub scan_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: 3000,
            #[cfg(feature = "distributed")]
            redis_pool_size: num_cpus::get() * 2,
            scan_batch_size: 200,
        }
    }
}

// ==========================================
// 3. 总配置入口 (CronConfig)
// ==========================================

/// 总配置
///
/// 使用分层结构组织配置项。支持 `serde` 序列化，可直接从 JSON 加载。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronConfig {
    /// 节点身份
    #[serde(default)]
    pub node: NodeConfig,

    /// 协调存储
    #[serde(default)]
    pub store: StoreConfig,

    /// 命名空间 (用于分配器等内部 Key 的前缀)
    /// 默认: "talos"
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "talos".to_string()
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            store: StoreConfig::default(),
            namespace: default_namespace(),
        }
    }
}

impl CronConfig {
    /// 快速创建一个开发环境配置
    pub fn new_dev() -> Self {
        let mut cfg = Self::default();
        // 开发环境下超时短一点，方便发现问题
        cfg.store.op_timeout_ms = 500;
        cfg.namespace = "talos-dev".to_string();
        cfg
    }

    /// 从 JSON 文本加载，缺省字段使用默认值
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 参数校验
    pub fn validate(&self) -> Result<()> {
        if self.node.host_name.trim().is_empty() {
            return Err(SchedulerError::Config("node.host_name cannot be empty".into()));
        }
        if self.node.machine_id > crate::allocator::MAX_MACHINE_ID {
            return Err(SchedulerError::Config(format!(
                "node.machine_id {} exceeds {}",
                self.node.machine_id,
                crate::allocator::MAX_MACHINE_ID
            )));
        }
        if self.store.op_timeout_ms == 0 {
            return Err(SchedulerError::Config("store.op_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
