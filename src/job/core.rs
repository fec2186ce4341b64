use std::sync::Arc;
use tracing::warn;

use super::model::JobSpec;
use crate::allocator::IdAllocator;
use crate::common::config::CronConfig;
use crate::common::error::{Result, SchedulerError};
use crate::common::get_hostname;
use crate::persistence::{CoordinationStore, LoadStatus};
use crate::task::{TaskBuilder, TaskResult, job_result_prefix, result_key};

/// 周期任务 (Job)
///
/// 由调度器持有并管理生命周期，它派生出的所有 Task 通过 `Arc<Job>` 只读共享它。
/// 对 Task 暴露的只有：Job 描述、主机名、协调存储、ID 分配器。
pub struct Job {
    spec: JobSpec,
    host_name: String,
    store: Arc<dyn CoordinationStore>,
    allocator: Arc<dyn IdAllocator>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("spec", &self.spec)
            .field("host_name", &self.host_name)
            .finish()
    }
}

impl Job {
    /// 创建构建器
    pub fn builder(spec: JobSpec) -> JobBuilder {
        JobBuilder::new(spec)
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn store(&self) -> &Arc<dyn CoordinationStore> {
        &self.store
    }

    pub fn allocator(&self) -> &Arc<dyn IdAllocator> {
        &self.allocator
    }

    /// 开始配置一次新的执行
    pub fn new_task(self: &Arc<Self>) -> TaskBuilder {
        TaskBuilder::new(self.clone())
    }

    /// 该 Job 所有执行记录共用的 Key 前缀
    pub fn result_prefix(&self) -> String {
        job_result_prefix(&self.spec.id)
    }

    /// 读取某一次执行的记录
    pub async fn load_result(&self, task_id: u64) -> Result<LoadStatus> {
        let key = result_key(&self.spec.id, task_id);
        match self.store.get(&key).await? {
            None => Ok(LoadStatus::NotFound),
            Some(raw) => Ok(match serde_json::from_str::<TaskResult>(&raw) {
                Ok(result) => LoadStatus::Found(result),
                Err(e) => LoadStatus::DataCorrupted {
                    reason: e.to_string(),
                    raw_content: raw,
                },
            }),
        }
    }

    /// 列出该 Job 在存储中的全部执行记录，按 TaskID 升序
    ///
    /// 损坏的记录会被跳过并记录 warn 日志。
    pub async fn list_results(&self) -> Result<Vec<TaskResult>> {
        let entries = self.store.scan_prefix(&self.result_prefix()).await?;
        let mut results = Vec::with_capacity(entries.len());
        for (key, raw) in entries {
            match serde_json::from_str::<TaskResult>(&raw) {
                Ok(result) => results.push(result),
                Err(e) => warn!("[Job] Skip corrupted task result {}: {}", key, e),
            }
        }
        // Key 按字典序返回 ("/10" 排在 "/9" 之前)，这里改为数值序
        results.sort_by_key(|r| r.task_id);
        Ok(results)
    }
}

// ==========================================
// Job 构建器 (JobBuilder)
// ==========================================

/// Job 构建器
///
/// 用于一步步配置并生成 Job 实例。
pub struct JobBuilder {
    /// 必填: Job 描述
    spec: JobSpec,
    /// 选填: 显式指定的主机名，优先级最高
    host_name: Option<String>,
    /// 选填: 来自全局配置的主机名
    config_host_name: Option<String>,
    /// 协调存储 (必须)
    store: Option<Arc<dyn CoordinationStore>>,
    /// ID 分配器 (必须)
    allocator: Option<Arc<dyn IdAllocator>>,
}

impl JobBuilder {
    pub fn new(spec: JobSpec) -> Self {
        Self {
            spec,
            host_name: None,
            config_host_name: None,
            store: None,
            allocator: None,
        }
    }

    /// [可选] 从全局配置读取节点信息
    ///
    /// 与调用顺序无关，`host_name()` 显式设置的值始终优先。
    pub fn config(mut self, config: &CronConfig) -> Self {
        self.config_host_name = Some(config.node.host_name.clone());
        self
    }

    /// [可选] 设置主机名，覆盖配置
    pub fn host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    /// [必填] 注入协调存储
    pub fn store<S: CoordinationStore>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// [必填] 注入已共享的协调存储
    pub fn shared_store(mut self, store: Arc<dyn CoordinationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// [必填] 注入 ID 分配器
    pub fn allocator<A: IdAllocator>(mut self, allocator: A) -> Self {
        self.allocator = Some(Arc::new(allocator));
        self
    }

    /// [必填] 注入已共享的 ID 分配器
    pub fn shared_allocator(mut self, allocator: Arc<dyn IdAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// [核心] 构建 Job
    pub fn build(self) -> Result<Arc<Job>> {
        self.spec.validate()?;

        let store = self
            .store
            .ok_or_else(|| SchedulerError::Config("job requires a coordination store".into()))?;
        let allocator = self
            .allocator
            .ok_or_else(|| SchedulerError::Config("job requires an id allocator".into()))?;
        let host_name = self
            .host_name
            .or(self.config_host_name)
            .unwrap_or_else(get_hostname);

        Ok(Arc::new(Job {
            spec: self.spec,
            host_name,
            store,
            allocator,
        }))
    }
}
