use thiserror::Error;

/// 统一结果类型
///
/// 使用此别名可以简化函数签名：`fn do_something() -> Result<()>`
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Error, Debug)]
pub enum SchedulerError {
    // ==========================================
    // 1. 配置与构建错误 (Configuration & Build)
    // ==========================================
    /// 配置错误
    ///
    /// - 触发场景: Builder 缺少必填组件、参数校验不通过 (如 machine_id 越界)。
    /// - 后果: Job / 分配器构建失败。
    /// - 处理: 检查配置文件或构建参数。
    #[error("Configuration error: {0}")]
    Config(String),

    /// Job ID 非法
    ///
    /// - 触发场景: Job ID 为空，或者包含 Key 分隔符 `/`。
    /// - 后果: Job 构建被拒绝。
    /// - 说明: 结果 Key 的格式为 `<prefix><job_id>/<task_id>`，
    ///   如果 Job ID 中含有 `/`，不同 Job 的 Key 空间会互相重叠。
    #[error("Invalid job id {0:?}: must be non-empty and must not contain '/'.")]
    InvalidJobId(String),

    // ==========================================
    // 2. 身份分配错误 (Identity)
    // ==========================================
    /// 任务 ID 分配失败
    ///
    /// - 触发场景: 分配器不可达 (Redis 断开)、时钟回拨、或者分配器返回了保留值 0。
    /// - 后果: Task 构建失败，不会写入任何记录。
    /// - 处理: 调用方决定是否跳过本次触发或稍后重试。
    #[error("Task id allocation failed: {0}")]
    IdAllocation(String),

    // ==========================================
    // 3. 存储与 IO 错误 (Store & IO)
    // ==========================================
    /// Redis 交互失败
    ///
    /// - 触发场景: 网络抖动、Redis 重启、或 Redis 处于 Loading 状态。
    #[cfg(feature = "distributed")]
    #[error("Redis interaction failed: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    /// Redis 连接池错误
    ///
    /// - 触发场景: 连接池耗尽、建连超时。
    #[cfg(feature = "distributed")]
    #[error("Redis pool failed: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// 存储操作超时
    ///
    /// - 触发场景: 单次存储操作超过 `StoreConfig::op_timeout_ms`。
    /// - 字段: 超时的 Key。
    #[error("Coordination store operation on {0} timed out.")]
    StoreTimeout(String),

    /// 协调存储通用错误
    ///
    /// - 说明: 用于包装其他存储实现 (etcd / 内存 / 测试桩) 的错误。
    #[error("Coordination store failure: {0}")]
    Store(String),

    /// 序列化/反序列化失败
    ///
    /// - 触发场景: 存储里的 JSON 损坏，或者记录格式不兼容。
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // ==========================================
    // 4. 执行结果 (Execution)
    // ==========================================
    /// 任务执行超时
    ///
    /// - 触发场景: 执行时间超过 Job 的 `timeout` 设置。
    /// - 字段: 超时的 TaskID。
    #[error("Task {0} execution timed out.")]
    TaskTimeout(u64),

    /// 任务自身逻辑错误
    ///
    /// - 触发场景: 用户闭包返回 `Err`，或者发生 Panic。
    #[error("Task execution failed: {0}")]
    TaskFailure(String),
}

impl SchedulerError {
    /// 判断该错误是否值得重试 (Retryable)
    ///
    /// 本库自身不做重试，这个判断留给上层的触发循环使用。
    ///
    /// - 返回 `true`: 网络抖动、存储超时、分配器暂时不可用。
    /// - 返回 `false`: 配置错误、非法 ID、数据损坏。
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "distributed")]
            SchedulerError::Redis(e) => {
                e.is_connection_dropped() || e.is_cluster_error() || e.is_io_error() || e.is_timeout()
            }
            #[cfg(feature = "distributed")]
            SchedulerError::Pool(_) => true,

            SchedulerError::StoreTimeout(_) => true,
            SchedulerError::Store(_) => true,
            SchedulerError::IdAllocation(_) => true,
            SchedulerError::TaskTimeout(_) => true,
            SchedulerError::TaskFailure(_) => true,

            SchedulerError::Config(_) => false,
            SchedulerError::InvalidJobId(_) => false,
            SchedulerError::Serialization(_) => false,
        }
    }
}
