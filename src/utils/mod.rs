//! Utility modules supporting the search client.
//!
//! - [`ResultCache`]: typed TTL cache over a [`CacheStore`] ([`RedisStore`], [`MemoryStore`])
//! - [`HttpClient`]: reqwest-backed [`Transport`] for upstream calls
//! - [`SingleFlight`]: per-key coalescing of concurrent identical work
//! - [`validate_url`]: endpoint validation for configuration
//!
//! # Caching search results
//!
//! ```rust,no_run
//! use academic_papers_search::models::FilterCriteria;
//! use academic_papers_search::query::{compile, derive_key};
//! use academic_papers_search::utils::{MemoryStore, ResultCache, STANDARD_TTL};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ResultCache::new(Arc::new(MemoryStore::new()), STANDARD_TTL);
//! let compiled = compile(&FilterCriteria::new().title("graphs"));
//! let key = derive_key(&compiled.clauses, compiled.limit);
//!
//! cache.set(&key, &[]).await?;
//! assert!(cache.get(&key).await.is_hit());
//! # Ok(())
//! # }
//! ```

mod cache;
mod flight;
mod http;
mod validate;

pub use cache::{
    CacheError, CacheLookup, CacheStore, MemoryStore, RedisStore, ResultCache, STANDARD_TTL,
};
pub use flight::SingleFlight;
pub use http::{HttpClient, Transport, UpstreamRequest, UpstreamResponse, DEFAULT_TIMEOUT};
pub use validate::{validate_url, ValidationError};
