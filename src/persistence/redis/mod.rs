mod core;
mod store;

pub use self::core::RedisStore;
