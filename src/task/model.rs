use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::JobSpec;

// ==========================================
// 1. 执行状态 (CronTaskStatus)
// ==========================================

/// 单次执行的状态
///
/// 序列化后的字符串 ("processing" / "success" / "failed" / "timeout")
/// 是对外契约，看板与其他节点依赖它，不可修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronTaskStatus {
    /// 执行中 (唯一的非终态)
    Processing,
    /// 执行成功
    Success,
    /// 执行失败 (返回错误或 Panic)
    Failed,
    /// 执行超时
    Timeout,
}

impl CronTaskStatus {
    /// 状态是否是终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CronTaskStatus::Success | CronTaskStatus::Failed | CronTaskStatus::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CronTaskStatus::Processing => "processing",
            CronTaskStatus::Success => "success",
            CronTaskStatus::Failed => "failed",
            CronTaskStatus::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for CronTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 2. 触发类型 (ExecuteType)
// ==========================================

/// 触发类型，序列化为整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExecuteType {
    /// 定时任务自动执行
    #[default]
    Auto = 0,
    /// 手动触发
    Manual = 1,
}

impl From<ExecuteType> for u8 {
    fn from(t: ExecuteType) -> Self {
        t as u8
    }
}

impl TryFrom<u8> for ExecuteType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ExecuteType::Auto),
            1 => Ok(ExecuteType::Manual),
            other => Err(format!("unknown execute_type {}", other)),
        }
    }
}

// ==========================================
// 3. 执行记录 (TaskResult)
// ==========================================

/// 执行记录
///
/// - 每次 `set_status` 都会重新生成一份快照并整体覆盖写入存储。
/// - 字段名是对外契约。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: u64,
    pub execute_type: ExecuteType,
    pub status: CronTaskStatus,
    pub job: JobSpec,
    pub logs: String,
    /// 执行节点的主机名
    pub run_on: String,
    pub executed_at: DateTime<Utc>,
    /// 未进入终态时为 null
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskResult {
    /// 执行耗时，未结束时返回 None
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|f| f - self.executed_at)
    }
}
