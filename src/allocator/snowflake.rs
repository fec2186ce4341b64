use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::IdAllocator;
use crate::common::config::CronConfig;
use crate::common::TimeUtils;
use crate::common::error::{Result, SchedulerError};

// ==========================================
// 位布局: | 41 bit 毫秒时间戳 | 10 bit 机器号 | 12 bit 序列号 |
// ==========================================

/// 起始纪元: 2024-01-01T00:00:00Z (毫秒)
const EPOCH_MS: u64 = 1_704_067_200_000;

const MACHINE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const TIMESTAMP_BITS: u32 = 41;

/// 机器号上限 (含)
pub const MAX_MACHINE_ID: u16 = (1 << MACHINE_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// 序列号用完后等待时钟前进的最大次数 (每次 1ms)
const MAX_EXHAUSTED_WAITS: u32 = 10;

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

struct State {
    /// 上一次分配所在的毫秒 (相对 EPOCH)
    last_ms: u64,
    /// 同一毫秒内的序列号
    sequence: u64,
}

/// Snowflake 风格的分配器
///
/// - 只要集群内每个节点的 `machine_id` 不同，生成的 ID 就全局唯一。
/// - 单节点内严格递增；每毫秒最多 4096 个，用尽后异步等待下一毫秒，
///   时钟长时间不前进则返回 `IdAllocation`。
/// - 时钟回拨时拒绝分配，返回 `IdAllocation`。
pub struct SnowflakeAllocator {
    machine_id: u64,
    state: Mutex<State>,
    clock: Clock,
}

impl std::fmt::Debug for SnowflakeAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeAllocator")
            .field("machine_id", &self.machine_id)
            .finish()
    }
}

impl SnowflakeAllocator {
    /// 使用系统时钟创建
    pub fn new(machine_id: u16) -> Result<Self> {
        Self::with_clock(machine_id, TimeUtils::now_millis)
    }

    /// 使用节点配置中的 `node.machine_id` 创建
    pub fn from_config(config: &CronConfig) -> Result<Self> {
        Self::new(config.node.machine_id)
    }

    /// 注入自定义时钟 (Unix 毫秒)
    pub fn with_clock<F>(machine_id: u16, clock: F) -> Result<Self>
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        if machine_id > MAX_MACHINE_ID {
            return Err(SchedulerError::Config(format!(
                "machine_id {} exceeds {}",
                machine_id, MAX_MACHINE_ID
            )));
        }
        Ok(Self {
            machine_id: machine_id as u64,
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
            clock: Box::new(clock),
        })
    }

    /// 从 ID 中解析出机器号
    pub fn machine_id_of(id: u64) -> u16 {
        ((id >> SEQUENCE_BITS) & MAX_MACHINE_ID as u64) as u16
    }

    fn elapsed_ms(&self) -> Result<u64> {
        let now = (self.clock)();
        now.checked_sub(EPOCH_MS)
            .ok_or_else(|| SchedulerError::IdAllocation(format!("clock {} is before epoch", now)))
    }

    /// 尝试在当前毫秒内分配
    ///
    /// 返回 `Ok(None)` 表示当前毫秒的序列号已用完，状态保持不变，调用方稍后重试。
    fn try_generate(&self) -> Result<Option<u64>> {
        let mut state = self.state.lock();
        let now = self.elapsed_ms()?;

        if now < state.last_ms {
            return Err(SchedulerError::IdAllocation(format!(
                "clock moved backwards by {} ms",
                state.last_ms - now
            )));
        }

        let sequence = if now == state.last_ms {
            if state.sequence == MAX_SEQUENCE {
                return Ok(None);
            }
            state.sequence + 1
        } else {
            0
        };

        if now > MAX_TIMESTAMP {
            return Err(SchedulerError::IdAllocation("timestamp bits exhausted".into()));
        }
        state.last_ms = now;
        state.sequence = sequence;

        let id = (now << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | sequence;
        if id == 0 {
            return Err(SchedulerError::IdAllocation("generated reserved id 0".into()));
        }
        Ok(Some(id))
    }
}

#[async_trait]
impl IdAllocator for SnowflakeAllocator {
    async fn next_id(&self) -> Result<u64> {
        // 序列号用完时释放锁，异步等待时钟前进，最多等待 MAX_EXHAUSTED_WAITS 次
        for _ in 0..=MAX_EXHAUSTED_WAITS {
            if let Some(id) = self.try_generate()? {
                return Ok(id);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Err(SchedulerError::IdAllocation(format!(
            "sequence exhausted and clock did not advance within {} ms",
            MAX_EXHAUSTED_WAITS
        )))
    }
}
