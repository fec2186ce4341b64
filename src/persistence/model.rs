use crate::task::TaskResult;

/// 加载状态枚举
#[derive(Debug)]
pub enum LoadStatus {
    /// 成功加载：记录存在且完整
    Found(TaskResult),
    /// 记录不存在：从未写入，或已被 `Task::stop` 清理
    NotFound,
    /// 数据损坏：记录存在但无法解析（如 JSON 反序列化失败）
    DataCorrupted { reason: String, raw_content: String },
}
