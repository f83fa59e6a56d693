pub mod redis_manager;
pub mod types;

pub use redis_manager::RedisManager;
pub use types::StreamEnvelope;
