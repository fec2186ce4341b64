use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

use super::core::Task;
use super::model::{CronTaskStatus, ExecuteType};
use crate::common::error::{Result, SchedulerError};
use crate::job::{Job, JobSpec};

// ==========================================
// 1. 执行上下文 (TaskContext)
// ==========================================

/// 面向用户的执行上下文
#[derive(Clone)]
pub struct TaskContext {
    task_id: u64,
    execute_type: ExecuteType,
    job: Arc<Job>,
    token: CancellationToken,
}

impl TaskContext {
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    pub fn execute_type(&self) -> ExecuteType {
        self.execute_type
    }

    pub fn job(&self) -> &JobSpec {
        self.job.spec()
    }

    /// 超时或停机时会被取消
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// 判断是否取消
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待取消信号
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

// ==========================================
// 2. 执行器 (TaskExecutor)
// ==========================================

/// 执行器
///
/// 驱动一次完整的执行并把结果写入协调存储：
/// Processing -> 执行用户闭包 (超时 / Panic 保护) -> 终态 -> 清理动作。
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor {
    /// 全局停机信号，每次执行派生一个子令牌
    shutdown: CancellationToken,
}

impl TaskExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入外部停机信号 (用于多组件协同)
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    /// 触发停机，正在执行的任务会收到取消信号
    pub fn shutdown(&self) {
        trace!("[Executor] Shutdown triggered.");
        self.shutdown.cancel();
    }

    /// 执行一次任务
    ///
    /// - 用户闭包返回 `Ok(logs)` 记为 Success，`Err` 或 Panic 记为 Failed，
    ///   超过 Job 的 `timeout` 记为 Timeout 并取消上下文令牌。
    /// - Processing 写入失败只记日志，任务照常执行；终态写入失败会返回错误。
    /// - 无论终态是否写入成功，清理动作都会按注册顺序执行一次。
    pub async fn execute<F, Fut>(&self, mut task: Task, f: F) -> Result<CronTaskStatus>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        if let Err(e) = task.set_status(CronTaskStatus::Processing, "").await {
            warn!("[Executor] Record processing for {} failed: {:?}", task.key(), e);
        }

        let token = self.shutdown.child_token();
        let ctx = TaskContext {
            task_id: task.task_id(),
            execute_type: task.execute_type(),
            job: task.job().clone(),
            token: token.clone(),
        };

        // 闭包本身的同步部分也放进 catch_unwind
        let run = AssertUnwindSafe(async move { f(ctx).await }).catch_unwind();
        let outcome = match task.job().spec().timeout_duration() {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(res) => flatten(res),
                Err(_) => {
                    token.cancel();
                    Err(SchedulerError::TaskTimeout(task.task_id()))
                }
            },
            None => flatten(run.await),
        };

        let (status, logs) = match outcome {
            Ok(logs) => (CronTaskStatus::Success, logs),
            Err(e @ SchedulerError::TaskTimeout(_)) => (CronTaskStatus::Timeout, e.to_string()),
            Err(e) => (CronTaskStatus::Failed, e.to_string()),
        };

        let recorded = task.set_status(status, &logs).await;
        if let Err(e) = &recorded {
            error!("[Executor] Record {} for {} failed: {:?}", status, task.key(), e);
        }
        let defers = task.run_defers();
        trace!(
            "[Executor] Task {} finished as {} ({} deferred actions run)",
            task.task_id(),
            status,
            defers
        );

        recorded.map(|_| status)
    }
}

/// 把 Panic 与用户错误统一折叠为 `TaskFailure`
fn flatten(
    res: std::result::Result<anyhow::Result<String>, Box<dyn std::any::Any + Send>>,
) -> Result<String> {
    match res {
        Ok(Ok(logs)) => Ok(logs),
        Ok(Err(e)) => Err(SchedulerError::TaskFailure(format!("{:#}", e))),
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                format!("Panic: {}", s)
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                format!("Panic: {}", s)
            } else {
                "Panic: Unknown error".to_string()
            };
            Err(SchedulerError::TaskFailure(msg))
        }
    }
}
