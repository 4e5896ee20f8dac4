use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::fmt;
use std::time::{Duration, Instant};

/// Failures reported by a key-value store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or rejected the command.
    Unavailable(String),
    /// Stored value could not be decoded.
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Corrupt store value: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value store consulted by the method handlers.
///
/// `get` is the authoritative read and its errors must reach the caller.
/// The `cache_*` pair is best-effort: callers log failures and carry on.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn cache_set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;
}

/// Cached value plus the TTL it was written with.
#[derive(Clone)]
struct Timed {
    value: String,
    ttl: Duration,
}

/// Expires each cache entry after the TTL given to its `cache_set`.
struct PerEntryTtl;

impl Expiry<String, Timed> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Timed, _now: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Timed,
        _now: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process store backed by moka caches.
///
/// Data written with [`MemoryStore::insert`] never expires. Cache entries are
/// evicted by moka once the TTL passed to `cache_set` elapses.
#[derive(Clone)]
pub struct MemoryStore {
    data: Cache<String, String>,
    cache: Cache<String, Timed>,
}

impl MemoryStore {
    pub fn new(cache_capacity: u64) -> Self {
        Self {
            data: Cache::builder().build(),
            cache: Cache::builder()
                .max_capacity(cache_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Seeds an authoritative value, e.g. `i:<client_id>` interest lists.
    pub async fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into()).await;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.get(key).await)
    }

    async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn cache_set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            self.cache.invalidate(key).await;
            return Ok(());
        }
        self.cache.insert(key.to_string(), Timed { value, ttl }).await;
        Ok(())
    }
}

#[cfg(feature = "redis-store")]
pub use self::redis_store::RedisStore;

#[cfg(feature = "redis-store")]
mod redis_store {
    use super::{Store, StoreError};
    use async_trait::async_trait;
    use redis::aio::MultiplexedConnection;
    use std::time::Duration;

    /// Redis backend sharing one multiplexed connection across requests.
    #[derive(Clone)]
    pub struct RedisStore {
        conn: MultiplexedConnection,
    }

    impl RedisStore {
        pub async fn connect(url: &str) -> Result<Self, StoreError> {
            let client = redis::Client::open(url).map_err(unavailable)?;
            let conn = client
                .get_multiplexed_tokio_connection()
                .await
                .map_err(unavailable)?;
            tracing::info!("Connected to Redis store");
            Ok(Self { conn })
        }

        async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
            let mut conn = self.conn.clone();
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut conn)
                .await
                .map_err(unavailable)
        }
    }

    fn unavailable(err: redis::RedisError) -> StoreError {
        StoreError::Unavailable(err.to_string())
    }

    #[async_trait]
    impl Store for RedisStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.fetch(key).await
        }

        async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.fetch(key).await
        }

        async fn cache_set(
            &self,
            key: &str,
            value: String,
            ttl: Duration,
        ) -> Result<(), StoreError> {
            let mut conn = self.conn.clone();
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(unavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_seeded_values() {
        let store = MemoryStore::default();
        store.insert("i:1", r#"["books","music"]"#).await;

        assert_eq!(
            store.get("i:1").await.unwrap().as_deref(),
            Some(r#"["books","music"]"#)
        );
        assert_eq!(store.get("i:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_entries_expire() {
        let store = MemoryStore::default();
        store
            .cache_set("uid:a", "3.0".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .cache_set("uid:b", "1.5".to_string(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(store.cache_get("uid:a").await.unwrap().as_deref(), Some("3.0"));
        assert_eq!(store.cache_get("uid:b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_entry_expires_after_its_ttl() {
        let store = MemoryStore::default();
        store
            .cache_set("uid:short", "0.5".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        store
            .cache_set("uid:long", "2.0".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.cache_get("uid:short").await.unwrap().as_deref(), Some("0.5"));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.cache_get("uid:short").await.unwrap(), None);
        assert_eq!(store.cache_get("uid:long").await.unwrap().as_deref(), Some("2.0"));
    }

    #[tokio::test]
    async fn test_rewrite_replaces_ttl() {
        let store = MemoryStore::default();
        store
            .cache_set("uid:a", "1.0".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        store
            .cache_set("uid:a", "1.5".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.cache_get("uid:a").await.unwrap().as_deref(), Some("1.5"));
    }

    #[tokio::test]
    async fn test_cache_and_data_are_separate() {
        let store = MemoryStore::default();
        store
            .cache_set("k", "cached".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
