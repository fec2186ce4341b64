pub mod sequence;
pub mod snowflake;
pub mod traits;

#[cfg(feature = "distributed")]
pub mod redis;

pub use sequence::SequenceAllocator;
pub use snowflake::{MAX_MACHINE_ID, SnowflakeAllocator};
pub use traits::IdAllocator;

#[cfg(feature = "distributed")]
pub use redis::RedisIdAllocator;
