//! End-to-end orchestration of a single query: cache lookup, embedding,
//! similarity scan, cache write-back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use core_types::{SearchHit, SearchRequest, SearchResponse};
use entry_store::{EntryStore, StoreError};
use query_cache::{CacheBackend, CacheKey};
use semantic_index::{RankError, Ranker};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::embedder::{Embedder, EmbedderError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("embedding unavailable")]
    EmbeddingUnavailable(#[source] EmbedderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Deadlines and retry policy for the external collaborators.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Deadline for a single cache get/put; expiry degrades to a miss.
    pub cache_op_timeout: Duration,
    /// Per-attempt deadline for an embed call.
    pub embed_timeout: Duration,
    /// Attempts before an embed failure becomes fatal for the query.
    pub embed_max_retries: u32,
    /// Base of the exponential backoff between embed attempts.
    pub embed_backoff_base: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_op_timeout: Duration::from_millis(250),
            embed_timeout: Duration::from_secs(5),
            embed_max_retries: 3,
            embed_backoff_base: Duration::from_secs(1),
        }
    }
}

/// Orchestrates one query end-to-end. Pure read path over the store; the
/// cache is its only write side-effect.
pub struct QueryCoordinator {
    store: Arc<EntryStore>,
    ranker: Arc<dyn Ranker>,
    cache: Arc<dyn CacheBackend>,
    embedder: Arc<dyn Embedder>,
    config: CoordinatorConfig,
}

impl QueryCoordinator {
    pub fn new(
        store: Arc<EntryStore>,
        ranker: Arc<dyn Ranker>,
        cache: Arc<dyn CacheBackend>,
        embedder: Arc<dyn Embedder>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            ranker,
            cache,
            embedder,
            config,
        }
    }

    /// Run one query and return ranked hits, best first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        use_cache: bool,
    ) -> Result<Vec<SearchHit>, SearchError> {
        Ok(self.search_inner(query, k, use_cache).await?.0)
    }

    /// Request/response adapter for the API layer.
    pub async fn handle(&self, req: SearchRequest) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();
        let (hits, cache_hit) = self
            .search_inner(&req.query, req.top_k as usize, req.use_cache)
            .await?;
        Ok(SearchResponse {
            id: req.id,
            hits,
            cache_hit,
            took_ms: u32::try_from(started.elapsed().as_millis()).unwrap_or(u32::MAX),
        })
    }

    async fn search_inner(
        &self,
        query: &str,
        k: usize,
        use_cache: bool,
    ) -> Result<(Vec<SearchHit>, bool), SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidArgument("query must not be empty".into()));
        }
        if k == 0 {
            return Err(SearchError::InvalidArgument(
                "top_k must be greater than zero".into(),
            ));
        }

        let key = CacheKey::new(query, k);
        if use_cache && let Some(hits) = self.cache_get(&key).await {
            debug!(k, "cache hit");
            return Ok((hits, true));
        }

        let embedding = self
            .embed_with_retry(query)
            .await
            .map_err(SearchError::EmbeddingUnavailable)?;

        let entries = self.store.all();
        let hits = match self.ranker.rank(&embedding, &entries, k) {
            Ok(hits) => hits,
            Err(RankError::InvalidTopK) => {
                return Err(SearchError::InvalidArgument(
                    "top_k must be greater than zero".into(),
                ));
            }
        };

        if use_cache {
            self.cache_put(key, hits.clone()).await;
        }

        Ok((hits, false))
    }

    // Cache errors and timeouts degrade to a miss; the query proceeds.
    async fn cache_get(&self, key: &CacheKey) -> Option<Vec<SearchHit>> {
        match timeout(self.config.cache_op_timeout, self.cache.get(key)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(err)) => {
                warn!(error = %err, "cache lookup failed; computing directly");
                None
            }
            Err(_) => {
                warn!("cache lookup timed out; computing directly");
                None
            }
        }
    }

    // Best effort: a failed write-back only costs the next query a recompute.
    async fn cache_put(&self, key: CacheKey, hits: Vec<SearchHit>) {
        match timeout(self.config.cache_op_timeout, self.cache.put(key, hits)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "cache store failed; result not cached"),
            Err(_) => warn!("cache store timed out; result not cached"),
        }
    }

    // Exponential backoff between attempts: base, 2*base, 4*base, ...
    // Embedding failure is fatal for the query once attempts are exhausted;
    // no ranking is possible without a vector.
    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let attempts = self.config.embed_max_retries.max(1);
        let mut attempt = 0;
        loop {
            let result = match timeout(self.config.embed_timeout, self.embedder.embed(text)).await
            {
                Ok(result) => result,
                Err(_) => Err(EmbedderError::Timeout),
            };

            let err = match result {
                Ok(embedding) => return Ok(embedding),
                Err(err) => err,
            };

            attempt += 1;
            if attempt >= attempts {
                warn!(error = %err, attempts, "embedding failed after retries");
                return Err(err);
            }
            let wait = self.config.embed_backoff_base * (1u32 << (attempt - 1));
            warn!(error = %err, attempt, ?wait, "embedding failed; retrying");
            sleep(wait).await;
        }
    }
}
