pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

pub use memory::MemoryCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("key {0} holds a value of the wrong type")]
    WrongType(String),
}

/// Key-value operations the forecast cache relies on.
///
/// Each call is atomic for its key; nothing spans several calls.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` for `ttl`. A zero or negative `ttl` removes the key.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Replaces the list at `key`, expiring it at the wall-clock instant `expire_at`.
    async fn store_list(
        &self,
        key: &str,
        items: Vec<String>,
        expire_at: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    /// First `count` items of the list at `key`; empty when the key is absent.
    async fn range(&self, key: &str, count: usize) -> Result<Vec<String>, CacheError>;

    /// Remaining lifetime of `key`, if it exists and has a deadline.
    async fn ttl(&self, key: &str) -> Result<Option<std::time::Duration>, CacheError>;
}
