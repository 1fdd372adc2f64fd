//! CORE works search client.
//!
//! Uses the CORE v3 search endpoint for retrieving research papers.
//! API documentation: https://api.core.ac.uk/docs/v3

use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Config;
use crate::models::{FilterCriteria, PaperResult, SearchEnvelope};
use crate::query::{compile, derive_key, CacheKey, CompiledQuery};
use crate::sources::SearchError;
use crate::utils::{
    CacheLookup, HttpClient, ResultCache, SingleFlight, Transport, UpstreamRequest,
};

/// CORE v3 works search endpoint
pub const CORE_SEARCH_URL: &str = "https://api.core.ac.uk/v3/search/works/";

/// User agent sent with every upstream request
pub const USER_AGENT: &str = "Academic Papers Search";

/// Longest slice of an error body kept in [`SearchError::UpstreamStatus`]
const MAX_ERROR_BODY: usize = 512;

type FlightResult = Result<Vec<PaperResult>, SearchError>;

/// Cached CORE search client.
///
/// The transport and cache are injected at construction. Cloning is cheap and
/// clones share the same in-flight table.
#[derive(Debug, Clone)]
pub struct CoreClient {
    transport: Arc<dyn Transport>,
    cache: ResultCache,
    flights: Arc<SingleFlight<FlightResult>>,
    base_url: String,
    api_key: Option<String>,
}

impl CoreClient {
    pub fn new(transport: Arc<dyn Transport>, cache: ResultCache) -> Self {
        Self {
            transport,
            cache,
            flights: Arc::new(SingleFlight::new()),
            base_url: CORE_SEARCH_URL.to_string(),
            api_key: None,
        }
    }

    /// Build a client from loaded configuration, connecting the cache store.
    pub async fn from_config(config: &Config) -> Result<Self, SearchError> {
        let transport = HttpClient::new(&config.api.user_agent, config.api.timeout())?;
        let cache = ResultCache::from_config(&config.cache).await;

        let mut client = Self::new(Arc::new(transport), cache).base_url(&config.api.base_url);
        if let Some(ref key) = config.api.core_api_key {
            client = client.api_key(key);
        }
        Ok(client)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Search CORE, serving identical repeated searches from the cache.
    ///
    /// Concurrent misses for the same key share a single upstream call.
    pub async fn search(&self, criteria: &FilterCriteria) -> Result<Vec<PaperResult>, SearchError> {
        let compiled = compile(criteria);
        let key = derive_key(&compiled.clauses, compiled.limit);

        let recheck = match self.cache.get(&key).await {
            CacheLookup::Hit(results) => return Ok(results),
            CacheLookup::Miss => true,
            CacheLookup::Unavailable(e) => {
                tracing::warn!("Bypassing cache for {}: {}", key, e);
                false
            }
        };

        let fetch = || self.fetch_and_store(&compiled, &key, recheck);
        self.flights.run(key.as_str(), fetch).await
    }

    /// [`search`](Self::search) bounded by `deadline`.
    ///
    /// When the deadline passes, the in-flight upstream request and cache
    /// operations are dropped and [`SearchError::DeadlineExceeded`] is returned.
    pub async fn search_with_deadline(
        &self,
        criteria: &FilterCriteria,
        deadline: Instant,
    ) -> Result<Vec<PaperResult>, SearchError> {
        tokio::time::timeout_at(deadline, self.search(criteria))
            .await
            .map_err(|_| SearchError::DeadlineExceeded)?
    }

    /// Fetch the full response envelope, bypassing the cache.
    pub async fn search_envelope(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<SearchEnvelope, SearchError> {
        self.fetch(&compile(criteria)).await
    }

    /// Fetch upstream and store the result. With `recheck`, the cache is probed
    /// first since another caller may have populated the entry while we waited
    /// for the flight slot.
    async fn fetch_and_store(
        &self,
        compiled: &CompiledQuery,
        key: &CacheKey,
        recheck: bool,
    ) -> FlightResult {
        if recheck {
            if let CacheLookup::Hit(results) = self.cache.get(key).await {
                return Ok(results);
            }
        }

        let envelope = self.fetch(compiled).await?;

        if let Err(e) = self.cache.set(key, &envelope.results).await {
            tracing::warn!("Failed to cache search result {}: {}", key, e);
        }

        Ok(envelope.results)
    }

    fn build_request(&self, compiled: &CompiledQuery) -> UpstreamRequest {
        let mut query = Vec::new();
        if !compiled.is_empty() {
            query.push(("query".to_string(), compiled.canonical.clone()));
        }
        if compiled.limit != 0 {
            query.push(("limit".to_string(), compiled.limit.to_string()));
        }

        UpstreamRequest {
            url: self.base_url.clone(),
            query,
            bearer_token: self.api_key.clone(),
        }
    }

    async fn fetch(&self, compiled: &CompiledQuery) -> Result<SearchEnvelope, SearchError> {
        let request = self.build_request(compiled);
        tracing::debug!(
            "Searching CORE: query={:?} limit={}",
            compiled.canonical,
            compiled.limit
        );

        let response = self.transport.get(&request).await?;

        if !response.is_success() {
            let mut body = String::from_utf8_lossy(&response.body).into_owned();
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(SearchError::UpstreamStatus {
                status: response.status,
                body,
            });
        }

        let envelope: SearchEnvelope = serde_json::from_slice(&response.body)?;
        tracing::debug!(
            "CORE returned {} of {} hits",
            envelope.results.len(),
            envelope.total_hits
        );
        Ok(envelope)
    }
}
