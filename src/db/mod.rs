pub mod cache;
pub mod content;
pub mod library;
pub mod memory;
pub mod postgres;
pub mod redis;

mod macros;

pub use cache::{CacheKey, CacheNamespace, CacheStats, CacheStore, ResultCache};
pub use content::{ContentRepository, PgContentRepository};
pub use library::{LibrarySource, PgLibrarySource};
pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations};
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisStore};
