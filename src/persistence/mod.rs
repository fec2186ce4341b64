pub mod memory;
pub mod model;
pub mod traits;

#[cfg(feature = "distributed")]
pub mod redis;

#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use model::LoadStatus;
pub use traits::CoordinationStore;

#[cfg(feature = "distributed")]
pub use redis::RedisStore;
