use crate::job::KEY_SEPARATOR;

/// 执行记录的全局 Key 前缀，整个系统共用
pub const RESULT_KEY_PREFIX: &str = "/talos/cronjob/result/";

/// 某一次执行的记录 Key: `<prefix><job_id>/<task_id>`
pub fn result_key(job_id: &str, task_id: u64) -> String {
    format!("{}{}{}{}", RESULT_KEY_PREFIX, job_id, KEY_SEPARATOR, task_id)
}

/// 某个 Job 全部执行记录的共同前缀 (以分隔符结尾)
pub fn job_result_prefix(job_id: &str) -> String {
    format!("{}{}{}", RESULT_KEY_PREFIX, job_id, KEY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(
            result_key("daily-report", 42),
            "/talos/cronjob/result/daily-report/42"
        );
        assert!(result_key("daily-report", 42).starts_with(&job_result_prefix("daily-report")));
        assert!(!result_key("daily-report-v2", 1).starts_with(&job_result_prefix("daily-report")));
    }
}
