// Adapters layer: concrete implementations of the domain ports (store, stream).

pub mod memory_store;
pub mod redis_store;
pub mod twitter;

pub use memory_store::MemorySeenStore;
pub use redis_store::RedisSeenStore;
pub use twitter::TwitterStream;
