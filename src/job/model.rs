use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::common::error::{Result, SchedulerError};

/// Key 路径分隔符，Job ID 中不允许出现
pub const KEY_SEPARATOR: char = '/';

// ==========================================
// Job 描述 (JobSpec)
// ==========================================

/// Job 描述
///
/// - 这是周期任务的持久化定义，会原样嵌入每一条执行记录的 `job` 字段。
/// - `spec` 只作为文本保存，解析与触发由外部调度循环负责。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// 稳定的 Job 标识，同时是结果 Key 的一段路径
    pub id: String,

    /// 展示名称
    #[serde(default)]
    pub name: String,

    /// Cron 表达式 (e.g., "0 0 2 * * *")
    #[serde(default)]
    pub spec: String,

    /// 执行超时 (秒)，0 表示不限制
    #[serde(default)]
    pub timeout: u64,

    /// 扩展字段 (负责人、告警组等)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl JobSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            spec: String::new(),
            timeout: 0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_spec(mut self, cron_expr: impl Into<String>) -> Self {
        self.spec = cron_expr.into();
        self
    }

    /// 设置执行超时，精度为秒 (不足 1 秒按 1 秒计)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = match timeout.as_secs() {
            0 if !timeout.is_zero() => 1,
            secs => secs,
        };
        self
    }

    /// 添加元数据
    pub fn add_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// 执行超时，未设置时返回 None
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// 校验 Job ID
    ///
    /// 结果 Key 是 `<prefix><job_id>/<task_id>`，ID 里带分隔符会让两个 Job 的
    /// Key 空间重叠 (`a/1` + `2` 与 `a` + `1/2`)，这里直接拒绝。
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.id.contains(KEY_SEPARATOR) {
            return Err(SchedulerError::InvalidJobId(self.id.clone()));
        }
        Ok(())
    }
}
