pub mod store;

pub use store::create_redis_client;
pub use store::CacheWriterHandle;
pub use store::RedisStore;
