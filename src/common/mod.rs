pub mod config;
pub mod error;
pub mod time;
pub(crate) mod utils;

// 导出配置
pub use config::{CronConfig, NodeConfig, StoreConfig};

// 导出错误类型
pub use error::{Result, SchedulerError};

pub use time::TimeUtils;
// 内部工具的快捷访问
pub(crate) use utils::get_hostname;
