//! Result cache for search responses.
//!
//! [`ResultCache`] stores serialized result lists in a [`CacheStore`] with a
//! fixed time-to-live. The store owns entry lifetime; this layer keeps no
//! state of its own.
//!
//! # Backends
//!
//! - [`RedisStore`]: shared Redis instance, one `GET`/`SET PX` per operation
//! - [`MemoryStore`]: process-local map, used in tests and single-node setups
//!
//! # Failure handling
//!
//! A payload that no longer deserializes is reported as [`CacheLookup::Miss`]
//! so the caller refetches. An unreachable store is reported as
//! [`CacheLookup::Unavailable`] and never treated as fatal.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::models::PaperResult;
use crate::query::CacheKey;

/// Standard lifetime of a cached result list
pub const STANDARD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors raised by a cache store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The backing store could not be reached or rejected the operation
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// A stored payload could not be encoded or decoded
    #[error("Corrupt cache payload: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Unavailable(err.to_string())
    }
}

/// Result of a cache lookup
#[derive(Debug)]
pub enum CacheLookup<T> {
    /// Item was found and decoded
    Hit(T),

    /// Item was absent, expired, or undecodable
    Miss,

    /// The store could not be consulted
    Unavailable(CacheError),
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn hit(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}

/// A durable key-value store with per-entry expiry.
///
/// Implementations must be safe for concurrent use; each call is a single
/// atomic operation against the store.
#[async_trait]
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Fetch the raw payload for `key`, if present and not expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any existing entry
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

/// Redis-backed store using a reconnecting connection manager
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    operation_timeout: Duration,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect using the host, port, password and database index in `config`
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.redis_url())?;
        let operation_timeout = config.operation_timeout();

        let manager = tokio::time::timeout(operation_timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!(
                    "timed out connecting to Redis at {}:{}",
                    config.host, config.port
                ))
            })??;

        tracing::info!("Connected to Redis at {}:{}", config.host, config.port);
        Ok(Self {
            manager,
            operation_timeout,
        })
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Unavailable(format!(
                "Redis {} timed out after {:?}",
                op, self.operation_timeout
            ))),
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.manager.clone();
        self.bounded("GET", conn.get::<_, Option<Vec<u8>>>(key))
            .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
        self.bounded("SET", conn.pset_ex::<_, _, ()>(key, value, millis))
            .await
    }
}

/// Process-local store.
///
/// Expired entries are dropped when read and swept on every write. A TTL too
/// large to represent as an [`Instant`] never expires.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

fn expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|at| now >= at)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((_, expires_at)) if expired(*expires_at, Instant::now()) => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, (_, expires_at)| !expired(*expires_at, now));
        entries.insert(key.to_string(), (value, now.checked_add(ttl)));
        Ok(())
    }
}

/// Typed cache for search result lists
#[derive(Debug, Clone)]
pub struct ResultCache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl ResultCache {
    /// Cache backed by `store`, writing entries with `ttl`
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// A cache that always misses and never stores
    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: Duration::ZERO,
        }
    }

    /// Build the store selected by `config`.
    ///
    /// An unreachable Redis instance degrades to a disabled cache rather than
    /// failing startup.
    pub async fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            tracing::debug!("Cache is disabled");
            return Self::disabled();
        }

        let ttl = config.ttl();
        match config.backend {
            crate::config::CacheBackend::Memory => Self::new(Arc::new(MemoryStore::new()), ttl),
            crate::config::CacheBackend::Redis => match RedisStore::connect(config).await {
                Ok(store) => Self::new(Arc::new(store), ttl),
                Err(e) => {
                    tracing::warn!("Redis unavailable, continuing without cache: {}", e);
                    Self::disabled()
                }
            },
        }
    }

    /// Check if caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the result list stored under `key`
    pub async fn get(&self, key: &CacheKey) -> CacheLookup<Vec<PaperResult>> {
        let Some(store) = &self.store else {
            return CacheLookup::Miss;
        };

        match store.get(key.as_str()).await {
            Ok(Some(payload)) => match serde_json::from_slice::<Vec<PaperResult>>(&payload) {
                Ok(results) => {
                    tracing::debug!("Cache HIT for search: {}", key);
                    CacheLookup::Hit(results)
                }
                Err(e) => {
                    tracing::warn!("Discarding corrupt cache entry {}: {}", key, e);
                    CacheLookup::Miss
                }
            },
            Ok(None) => {
                tracing::debug!("Cache MISS for search: {}", key);
                CacheLookup::Miss
            }
            Err(e) => {
                tracing::warn!("Cache lookup failed for {}: {}", key, e);
                CacheLookup::Unavailable(e)
            }
        }
    }

    /// Store `results` under `key` with the configured TTL
    pub async fn set(&self, key: &CacheKey, results: &[PaperResult]) -> Result<(), CacheError> {
        self.set_with_ttl(key, results, self.ttl).await
    }

    /// Store `results` under `key`, overwriting any existing entry
    pub async fn set_with_ttl(
        &self,
        key: &CacheKey,
        results: &[PaperResult],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let payload =
            serde_json::to_vec(results).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        store.set(key.as_str(), payload, ttl).await?;
        tracing::debug!("Cached search result: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, FilterCriteria, FlexibleDate};
    use crate::query::{compile, derive_key};

    fn key(title: &str) -> CacheKey {
        let compiled = compile(&FilterCriteria::new().title(title));
        derive_key(&compiled.clauses, compiled.limit)
    }

    fn papers() -> Vec<PaperResult> {
        vec![PaperResult {
            id: 1,
            title: "Cached".to_string(),
            authors: vec![Author {
                name: "Ann".to_string(),
            }],
            created_date: FlexibleDate::from_ymd(2020, 5, 1).unwrap(),
            ..Default::default()
        }]
    }

    fn memory_cache() -> (Arc<MemoryStore>, ResultCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(store.clone(), STANDARD_TTL);
        (store, cache)
    }

    #[tokio::test]
    async fn test_set_then_get_hits() {
        let (_, cache) = memory_cache();
        let k = key("a");

        cache.set(&k, &papers()).await.unwrap();

        match cache.get(&k).await {
            CacheLookup::Hit(r) => assert_eq!(r, papers()),
            other => panic!("Expected cache hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_miss_then_populate() {
        let (_, cache) = memory_cache();
        let k = key("b");

        assert!(matches!(cache.get(&k).await, CacheLookup::Miss));
        cache.set(&k, &papers()).await.unwrap();
        assert!(cache.get(&k).await.is_hit());

        // Different query should be a miss
        assert!(matches!(cache.get(&key("c")).await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_, cache) = memory_cache();
        let k = key("d");

        cache.set(&k, &papers()).await.unwrap();
        cache.set(&k, &[]).await.unwrap();

        assert_eq!(cache.get(&k).await.hit(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_miss() {
        let (store, cache) = memory_cache();
        let k = key("e");

        store
            .set(k.as_str(), b"{not json".to_vec(), STANDARD_TTL)
            .await
            .unwrap();

        assert!(matches!(cache.get(&k).await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let (store, cache) = memory_cache();
        let k = key("f");

        cache
            .set_with_ttl(&k, &papers(), Duration::ZERO)
            .await
            .unwrap();

        assert!(matches!(cache.get(&k).await, CacheLookup::Miss));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_write_sweeps_expired_entries() {
        let store = MemoryStore::new();

        store
            .set("stale", b"[]".to_vec(), Duration::ZERO)
            .await
            .unwrap();
        store
            .set("fresh", b"[]".to_vec(), STANDARD_TTL)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let config = CacheConfig {
            backend: crate::config::CacheBackend::Memory,
            ttl_seconds: u64::MAX,
            ..CacheConfig::default()
        };
        let cache = ResultCache::from_config(&config).await;
        let k = key("h");

        cache.set(&k, &papers()).await.unwrap();
        cache
            .set_with_ttl(&k, &papers(), Duration::MAX)
            .await
            .unwrap();

        assert_eq!(cache.get(&k).await.hit(), Some(papers()));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache = ResultCache::disabled();
        let k = key("g");

        // Cache should be ignored when disabled
        cache.set(&k, &papers()).await.unwrap();
        assert!(!cache.is_enabled());
        assert!(matches!(cache.get(&k).await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let config = CacheConfig {
            backend: crate::config::CacheBackend::Memory,
            ..CacheConfig::default()
        };

        let cache = ResultCache::from_config(&config).await;
        assert!(cache.is_enabled());
        assert_eq!(cache.ttl(), STANDARD_TTL);
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_disabled() {
        let config = CacheConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            operation_timeout_ms: 200,
            ..CacheConfig::default()
        };

        let cache = ResultCache::from_config(&config).await;
        assert!(!cache.is_enabled());
    }
}
