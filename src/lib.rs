// 1. 基础模块
pub mod common;

// 2. 核心接口与实现
pub mod allocator;
pub mod persistence;

// 3. Job 与执行实例
pub mod job;
pub mod task;

pub use allocator::{IdAllocator, SequenceAllocator, SnowflakeAllocator};
pub use common::{CronConfig, Result, SchedulerError};
pub use job::{Job, JobBuilder, JobSpec};
pub use persistence::{CoordinationStore, LoadStatus, MemoryStore};
pub use task::{
    CronTaskStatus, ExecuteType, RESULT_KEY_PREFIX, Task, TaskBuilder, TaskContext, TaskExecutor,
    TaskOption, TaskResult,
};

#[cfg(feature = "distributed")]
pub use allocator::RedisIdAllocator;
#[cfg(feature = "distributed")]
pub use persistence::RedisStore;
