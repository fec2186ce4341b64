use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, trace, warn};

use super::key::result_key;
use super::model::{CronTaskStatus, ExecuteType, TaskResult};
use crate::common::TimeUtils;
use crate::common::error::Result;
use crate::job::Job;

/// 清理动作 (零参数闭包)
pub type DeferFn = Box<dyn FnOnce() + Send + 'static>;

/// 单次执行实例 (Task)
///
/// - 通过 `Job::new_task()` / `TaskBuilder` 构建，构建完成后 `task_id` 一定非 0。
/// - `set_status` 是唯一写入执行记录的地方；`stop` 尽力删除记录。
/// - 注册的清理动作不会被自动调用，持有者必须在丢弃 Task 前通过
///   `run_defers` / `take_defers` 按注册顺序执行它们。
pub struct Task {
    pub(super) task_id: u64,
    pub(super) execute_type: ExecuteType,

    /// 非拥有的回指，Job 的生命周期由调度器管理
    pub(super) job: Arc<Job>,
    pub(super) executed_at: DateTime<Utc>,
    pub(super) finished_at: Option<DateTime<Utc>>,
    pub(super) defers: Vec<DeferFn>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("task_id", &self.task_id)
            .field("execute_type", &self.execute_type)
            .field("job_id", &self.job.id())
            .field("executed_at", &self.executed_at)
            .field("finished_at", &self.finished_at)
            .field("defers", &self.defers.len())
            .finish()
    }
}

impl Task {
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    pub fn execute_type(&self) -> ExecuteType {
        self.execute_type
    }

    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// 尚未执行的清理动作数量
    pub fn pending_defers(&self) -> usize {
        self.defers.len()
    }

    /// 记录 Key，在 Task 的整个生命周期内不变
    pub fn key(&self) -> String {
        result_key(self.job.id(), self.task_id)
    }

    /// 生成当前时刻的执行记录快照
    pub fn snapshot(&self, status: CronTaskStatus, logs: &str) -> TaskResult {
        TaskResult {
            task_id: self.task_id,
            execute_type: self.execute_type,
            status,
            job: self.job.spec().clone(),
            logs: logs.to_string(),
            run_on: self.job.host_name().to_string(),
            executed_at: self.executed_at,
            finished_at: self.finished_at,
        }
    }

    /// 发布当前状态
    ///
    /// - 终态会把 `finished_at` 刷新为“现在”，重复调用时结束时间随之后移。
    /// - 整条记录无条件覆盖写入 (Last-Write-Wins)，失败直接返回，不重试。
    pub async fn set_status(&mut self, status: CronTaskStatus, logs: &str) -> Result<()> {
        if status.is_terminal() {
            self.finished_at = Some(TimeUtils::now());
        }

        let payload = serde_json::to_string(&self.snapshot(status, logs))?;
        let key = self.key();
        self.job.store().put(&key, &payload).await?;

        trace!("[Task] {} -> {}", key, status);
        Ok(())
    }

    /// 删除执行记录 (尽力而为)
    ///
    /// 失败只记日志，不向调用方返回；不会触发清理动作。
    pub async fn stop(&self) {
        let key = self.key();
        if let Err(e) = self.job.store().delete(&key).await {
            error!("[Task] Delete task result {} failed: {:?}", key, e);
        }
    }

    /// 取出全部清理动作 (按注册顺序)，由调用方负责执行
    pub fn take_defers(&mut self) -> Vec<DeferFn> {
        std::mem::take(&mut self.defers)
    }

    /// 按注册顺序执行并清空全部清理动作，返回执行数量
    pub fn run_defers(&mut self) -> usize {
        let defers = self.take_defers();
        let count = defers.len();
        for f in defers {
            f();
        }
        count
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        if !self.defers.is_empty() {
            warn!(
                "[Task] {} dropped with {} deferred actions never run",
                self.key(),
                self.defers.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SequenceAllocator;
    use crate::job::JobSpec;
    use crate::persistence::testing::{RecordingStore, StoreOp};
    use crate::task::RESULT_KEY_PREFIX;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recording_job() -> (Arc<RecordingStore>, Arc<Job>) {
        let store = Arc::new(RecordingStore::new());
        let job = Job::builder(JobSpec::new("daily-report"))
            .host_name("node-1")
            .store(store.clone())
            .allocator(SequenceAllocator::starting_at(42))
            .build()
            .unwrap();
        (store, job)
    }

    #[tokio::test]
    async fn key_is_stable() {
        let (_, job) = recording_job();
        let task = job.new_task().build().await.unwrap();
        assert_eq!(task.key(), task.key());
        assert_eq!(task.key(), format!("{}daily-report/42", RESULT_KEY_PREFIX));
    }

    #[tokio::test]
    async fn processing_never_sets_finished_at() {
        let (store, job) = recording_job();
        let mut task = job.new_task().build().await.unwrap();
        task.set_status(CronTaskStatus::Processing, "").await.unwrap();

        assert!(task.finished_at().is_none());
        let record = &store.put_values()[0];
        assert_eq!(record["status"], json!("processing"));
        assert!(record["finished_at"].is_null());
    }

    #[tokio::test]
    async fn every_terminal_status_sets_finished_at() {
        for status in [
            CronTaskStatus::Success,
            CronTaskStatus::Failed,
            CronTaskStatus::Timeout,
        ] {
            let (store, job) = recording_job();
            let mut task = job.new_task().build().await.unwrap();
            task.set_status(status, "x").await.unwrap();

            let finished = task.finished_at().unwrap();
            assert!(finished >= task.executed_at());
            let record = &store.put_values()[0];
            assert_eq!(record["status"], json!(status.as_str()));
            assert!(!record["finished_at"].is_null());
        }
    }

    #[tokio::test]
    async fn repeated_terminal_writes_move_finish_time_forward() {
        let (store, job) = recording_job();
        let mut task = job.new_task().build().await.unwrap();
        task.set_status(CronTaskStatus::Failed, "first").await.unwrap();
        let first = task.finished_at().unwrap();
        task.set_status(CronTaskStatus::Success, "second").await.unwrap();
        let second = task.finished_at().unwrap();
        assert!(second >= first);

        let records = store.put_values();
        assert_eq!(records.len(), 2);
        let parse = |v: &serde_json::Value| {
            serde_json::from_value::<DateTime<Utc>>(v["finished_at"].clone()).unwrap()
        };
        assert!(parse(&records[1]) >= parse(&records[0]));
    }

    #[tokio::test]
    async fn terminal_status_survives_a_later_processing_write() {
        let (_, job) = recording_job();
        let mut task = job.new_task().build().await.unwrap();
        task.set_status(CronTaskStatus::Success, "").await.unwrap();
        task.set_status(CronTaskStatus::Processing, "").await.unwrap();
        // finished_at 一旦设置就不会被清除
        assert!(task.finished_at().is_some());
    }

    #[tokio::test]
    async fn put_failure_is_propagated() {
        let (store, job) = recording_job();
        store.fail_puts(true);
        let mut task = job.new_task().build().await.unwrap();
        assert!(task.set_status(CronTaskStatus::Success, "").await.is_err());
        assert_eq!(store.ops().len(), 1);
    }

    #[tokio::test]
    async fn stop_deletes_once_and_swallows_failure() {
        let (store, job) = recording_job();
        store.fail_deletes(true);
        let task = job.new_task().build().await.unwrap();
        task.stop().await;

        assert_eq!(
            store.ops(),
            vec![StoreOp::Delete { key: task.key() }]
        );
    }

    #[tokio::test]
    async fn stop_does_not_run_defers() {
        let (_, job) = recording_job();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let mut task = job
            .new_task()
            .defer(move || *counter.lock() += 1)
            .build()
            .await
            .unwrap();

        task.stop().await;
        assert_eq!(*hits.lock(), 0);
        assert_eq!(task.run_defers(), 1);
        assert_eq!(*hits.lock(), 1);
        // 已经清空，不会重复执行
        assert_eq!(task.run_defers(), 0);
        assert_eq!(*hits.lock(), 1);
    }
}
