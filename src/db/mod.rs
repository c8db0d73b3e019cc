pub mod cache;
pub mod memory;
pub mod redis;

pub use self::cache::{Cache, CacheKey, CacheStore};
pub use self::memory::MemoryCache;
pub use self::redis::{create_redis_client, RedisCache};
