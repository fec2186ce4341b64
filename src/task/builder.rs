use std::sync::Arc;

use tracing::warn;

use super::core::{DeferFn, Task};
use super::model::ExecuteType;
use crate::common::TimeUtils;
use crate::common::error::{Result, SchedulerError};
use crate::job::Job;

// ==========================================
// 1. 构建选项 (TaskOption)
// ==========================================

/// Task 构建选项
///
/// 选项按给出的顺序依次生效：同类选项后者覆盖前者，`Defers` 例外，它是追加。
pub enum TaskOption {
    /// 指定 TaskID，跳过分配器 (0 表示仍然走分配器)
    TaskId(u64),
    /// 覆盖默认的 `Auto` 触发类型
    ExecuteType(ExecuteType),
    /// 追加清理动作
    Defers(Vec<DeferFn>),
}

impl TaskOption {
    pub fn with_task_id(task_id: u64) -> Self {
        TaskOption::TaskId(task_id)
    }

    pub fn with_execute_type(execute_type: ExecuteType) -> Self {
        TaskOption::ExecuteType(execute_type)
    }

    pub fn with_defers<I>(fns: I) -> Self
    where
        I: IntoIterator<Item = DeferFn>,
    {
        TaskOption::Defers(fns.into_iter().collect())
    }
}

impl std::fmt::Debug for TaskOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOption::TaskId(id) => f.debug_tuple("TaskId").field(id).finish(),
            TaskOption::ExecuteType(t) => f.debug_tuple("ExecuteType").field(t).finish(),
            TaskOption::Defers(fns) => write!(f, "Defers({})", fns.len()),
        }
    }
}

// ==========================================
// 2. 构建器 (TaskBuilder)
// ==========================================

/// Task 构建器
pub struct TaskBuilder {
    job: Arc<Job>,
    task_id: u64,
    execute_type: ExecuteType,
    defers: Vec<DeferFn>,
}

impl TaskBuilder {
    pub fn new(job: Arc<Job>) -> Self {
        Self {
            job,
            task_id: 0,
            execute_type: ExecuteType::Auto,
            defers: Vec::new(),
        }
    }

    /// 指定 TaskID
    pub fn task_id(mut self, task_id: u64) -> Self {
        self.task_id = task_id;
        self
    }

    /// 指定触发类型
    pub fn execute_type(mut self, execute_type: ExecuteType) -> Self {
        self.execute_type = execute_type;
        self
    }

    /// 追加一个清理动作
    pub fn defer<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.defers.push(Box::new(f));
        self
    }

    /// 追加一批清理动作，保留之前注册的
    pub fn defers<I>(mut self, fns: I) -> Self
    where
        I: IntoIterator<Item = DeferFn>,
    {
        self.defers.extend(fns);
        self
    }

    /// 应用单个选项
    pub fn option(self, option: TaskOption) -> Self {
        match option {
            TaskOption::TaskId(id) => self.task_id(id),
            TaskOption::ExecuteType(t) => self.execute_type(t),
            TaskOption::Defers(fns) => self.defers(fns),
        }
    }

    /// 按顺序应用一组选项
    pub fn options<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = TaskOption>,
    {
        options.into_iter().fold(self, TaskBuilder::option)
    }

    /// [核心] 构建 Task
    ///
    /// 未指定 TaskID 时向 Job 的分配器申请。分配失败 (或分配器返回 0)
    /// 返回 `IdAllocation`，不会产生 ID 为 0 的 Task。
    /// 分配失败时已登记的 Defer 不会执行，只记录一条 `warn!`。
    pub async fn build(self) -> Result<Task> {
        let executed_at = TimeUtils::now();

        let task_id = match self.task_id {
            0 => match self.allocate().await {
                Ok(id) => id,
                Err(e) => {
                    if !self.defers.is_empty() {
                        warn!(
                            "[Task] Job {} id allocation failed, {} deferred actions dropped: {}",
                            self.job.id(),
                            self.defers.len(),
                            e
                        );
                    }
                    return Err(e);
                }
            },
            id => id,
        };

        Ok(Task {
            task_id,
            execute_type: self.execute_type,
            job: self.job,
            executed_at,
            finished_at: None,
            defers: self.defers,
        })
    }
}

impl TaskBuilder {
    async fn allocate(&self) -> Result<u64> {
        match self.job.allocator().next_id().await {
            Ok(0) => Err(SchedulerError::IdAllocation(
                "allocator returned reserved id 0".into(),
            )),
            Ok(id) => Ok(id),
            Err(e @ SchedulerError::IdAllocation(_)) => Err(e),
            Err(e) => Err(SchedulerError::IdAllocation(e.to_string())),
        }
    }
}

impl Task {
    /// 使用选项列表构建 Task，等价于 `TaskBuilder::new(job).options(options).build()`
    pub async fn new<I>(job: Arc<Job>, options: I) -> Result<Task>
    where
        I: IntoIterator<Item = TaskOption>,
    {
        TaskBuilder::new(job).options(options).build().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SequenceAllocator;
    use crate::job::JobSpec;
    use crate::persistence::testing::{FixedAllocator, RecordingStore};
    use parking_lot::Mutex;

    fn job_with<A: crate::allocator::IdAllocator>(allocator: A) -> (Arc<RecordingStore>, Arc<Job>) {
        let store = Arc::new(RecordingStore::new());
        let job = Job::builder(JobSpec::new("daily-report"))
            .host_name("node-1")
            .store(store.clone())
            .allocator(allocator)
            .build()
            .unwrap();
        (store, job)
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> DeferFn {
        let log = log.clone();
        Box::new(move || log.lock().push(name))
    }

    #[tokio::test]
    async fn allocates_when_no_id_given() {
        let (_, job) = job_with(SequenceAllocator::starting_at(42));
        let task = job.new_task().build().await.unwrap();
        assert_eq!(task.task_id(), 42);
        assert_eq!(task.execute_type(), ExecuteType::Auto);
        assert!(task.finished_at().is_none());
    }

    #[tokio::test]
    async fn explicit_id_bypasses_allocator() {
        let (_, job) = job_with(FixedAllocator(None));
        let task = Task::new(job, [TaskOption::with_task_id(7)]).await.unwrap();
        assert_eq!(task.task_id(), 7);
    }

    #[tokio::test]
    async fn allocation_failure_is_surfaced() {
        let (store, job) = job_with(FixedAllocator(None));
        let err = job.new_task().build().await.unwrap_err();
        assert!(matches!(err, SchedulerError::IdAllocation(_)));
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn allocation_failure_drops_defers_without_running_them() {
        let (store, job) = job_with(FixedAllocator(None));
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = job
            .new_task()
            .defers([recorder(&log, "cleanup"), recorder(&log, "unlock")])
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, SchedulerError::IdAllocation(_)));
        assert!(log.lock().is_empty());
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn allocator_returning_zero_is_a_failure() {
        let (_, job) = job_with(FixedAllocator(Some(0)));
        let err = job.new_task().build().await.unwrap_err();
        assert!(matches!(err, SchedulerError::IdAllocation(_)));
    }

    #[tokio::test]
    async fn later_options_overwrite_earlier_ones() {
        let (_, job) = job_with(FixedAllocator(None));
        let task = Task::new(
            job,
            [
                TaskOption::with_task_id(1),
                TaskOption::with_execute_type(ExecuteType::Manual),
                TaskOption::with_task_id(2),
            ],
        )
        .await
        .unwrap();
        assert_eq!(task.task_id(), 2);
        assert_eq!(task.execute_type(), ExecuteType::Manual);
    }

    #[tokio::test]
    async fn zero_task_id_option_falls_back_to_allocator() {
        let (_, job) = job_with(SequenceAllocator::starting_at(9));
        let task = Task::new(job, [TaskOption::with_task_id(0)]).await.unwrap();
        assert_eq!(task.task_id(), 9);
    }

    #[tokio::test]
    async fn defers_accumulate_in_order() {
        let (_, job) = job_with(SequenceAllocator::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut task = Task::new(
            job,
            [
                TaskOption::with_defers([recorder(&log, "f1"), recorder(&log, "f2")]),
                TaskOption::with_defers([recorder(&log, "f3")]),
            ],
        )
        .await
        .unwrap();

        assert_eq!(task.pending_defers(), 3);
        assert_eq!(task.run_defers(), 3);
        assert_eq!(*log.lock(), vec!["f1", "f2", "f3"]);
    }

    #[tokio::test]
    async fn builder_and_option_defers_mix() {
        let (_, job) = job_with(SequenceAllocator::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let tail = log.clone();
        let mut task = job
            .new_task()
            .option(TaskOption::with_defers([recorder(&log, "a")]))
            .defer(move || tail.lock().push("b"))
            .build()
            .await
            .unwrap();

        for f in task.take_defers() {
            f();
        }
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(task.pending_defers(), 0);
    }
}
