//! Key-value stores the quote cache can sit on.
//!
//! - [`KeyValueStore`] - the operations the cache and alert store rely on
//! - [`RedisStore`] - production store shared between processes
//! - [`MemoryStore`] - single-process store with the same expiry semantics

mod memory;
mod redis_store;
mod traits;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;
pub use self::traits::KeyValueStore;
