mod builder;
mod core;
mod executor;
mod key;
pub mod model;

pub use self::builder::{TaskBuilder, TaskOption};
pub use self::core::{DeferFn, Task};
pub use executor::{TaskContext, TaskExecutor};
pub use key::{RESULT_KEY_PREFIX, job_result_prefix, result_key};
pub use model::{CronTaskStatus, ExecuteType, TaskResult};
