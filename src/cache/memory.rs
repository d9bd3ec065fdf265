use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use moka::Expiry;
use std::time::Instant;

#[derive(Clone, Debug)]
enum Value {
    Text(String),
    List(Vec<String>),
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    deadline: Option<Instant>,
}

/// Expires every entry at the deadline it was written with.
struct EntryDeadline;

impl Expiry<String, Entry> for EntryDeadline {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        created_at: Instant,
    ) -> Option<std::time::Duration> {
        entry
            .deadline
            .map(|deadline| deadline.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        updated_at: Instant,
        _duration_until_expiry: Option<std::time::Duration>,
    ) -> Option<std::time::Duration> {
        entry
            .deadline
            .map(|deadline| deadline.saturating_duration_since(updated_at))
    }
}

/// In-process cache shared by every request handler.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryDeadline)
            .build();
        Self { inner }
    }

    // moka may keep an expired entry around until its housekeeping runs
    async fn live_entry(&self, key: &str) -> Option<Entry> {
        let entry = self.inner.get(key).await?;
        match entry.deadline {
            Some(deadline) if deadline <= Instant::now() => None,
            _ => Some(entry),
        }
    }
}

fn to_std(duration: Duration) -> Option<std::time::Duration> {
    duration.to_std().ok().filter(|d| !d.is_zero())
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.live_entry(key).await {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text)),
            Some(_) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let Some(ttl) = to_std(ttl) else {
            self.inner.invalidate(key).await;
            return Ok(());
        };
        let entry = Entry {
            value: Value::Text(value),
            deadline: Some(Instant::now() + ttl),
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn store_list(
        &self,
        key: &str,
        items: Vec<String>,
        expire_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let Some(ttl) = to_std(expire_at - Utc::now()) else {
            self.inner.invalidate(key).await;
            return Ok(());
        };
        let entry = Entry {
            value: Value::List(items),
            deadline: Some(Instant::now() + ttl),
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn range(&self, key: &str, count: usize) -> Result<Vec<String>, CacheError> {
        match self.live_entry(key).await {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::List(items),
                ..
            }) => Ok(items.into_iter().take(count).collect()),
            Some(_) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<std::time::Duration>, CacheError> {
        Ok(self
            .live_entry(key)
            .await
            .and_then(|entry| entry.deadline)
            .map(|deadline| deadline.saturating_duration_since(Instant::now())))
    }
}
