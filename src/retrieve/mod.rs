//! Retrieval service
//!
//! Orchestrates one query: lazy store load, expansion, query embedding,
//! scoring and top-K selection. The service owns its collaborators, so
//! independent instances (and tests) never share hidden state.
//!
//! Retrieval degrades instead of failing: an empty corpus, a failed
//! expansion or a failed query embedding all still produce a report,
//! with the cause recorded alongside the (possibly empty) results.

use crate::config::Config;
use crate::embed::{create_embedder, validate_text, Embedder};
use crate::error::{Error, Result};
use crate::expand::{create_expander, expand_or_original, Expansion, QueryExpander};
use crate::rank::{rank, ScoredChunk};
use crate::store::{LoadOutcome, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Limits and timeouts applied per query
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub default_k: usize,
    pub max_k: usize,
    pub embed_timeout: Duration,
    pub expand_timeout: Duration,
}

impl RetrievalSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_k: config.query.default_k,
            max_k: config.query.max_k,
            embed_timeout: config.embedding.timeout(),
            expand_timeout: config.expansion.timeout(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything that happened while serving one query
#[derive(Debug)]
pub struct RetrievalReport {
    pub query: String,
    /// Set when this call triggered a snapshot load
    pub load: Option<LoadOutcome>,
    /// `None` when retrieval stopped before expansion (empty store)
    pub expansion: Option<Expansion>,
    /// Set when the query could not be embedded
    pub embedding_error: Option<Error>,
    pub results: Vec<ScoredChunk>,
}

impl RetrievalReport {
    fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            load: None,
            expansion: None,
            embedding_error: None,
            results: Vec::new(),
        }
    }

    /// Terms that were embedded for the search
    pub fn search_terms(&self) -> &str {
        self.expansion
            .as_ref()
            .map_or(self.query.as_str(), |e| e.terms.as_str())
    }
}

/// Query-time retrieval over a vector store
pub struct RetrievalService {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    expander: Arc<dyn QueryExpander>,
    settings: RetrievalSettings,
}

impl RetrievalService {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn Embedder>,
        expander: Arc<dyn QueryExpander>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            expander,
            settings,
        }
    }

    /// Build a service with the configured providers and snapshot path
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(VectorStore::new(config.store_path()));
        let embedder = create_embedder(&config.embedding)?;
        let expander = create_expander(config)?;
        Ok(Self::new(
            store,
            embedder,
            expander,
            RetrievalSettings::from_config(config),
        ))
    }

    /// Same service with a different expander
    pub fn with_expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.expander = expander;
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Effective result count for a requested `k`
    pub fn resolve_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_k)
            .min(self.settings.max_k)
    }

    /// Embed text with the configured provider; errors propagate
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;
        let timeout = self.settings.embed_timeout;
        tokio::time::timeout(timeout, self.embedder.embed(text))
            .await
            .map_err(|_| Error::Timeout {
                operation: "embedding",
                secs: timeout.as_secs(),
            })?
    }

    /// Retrieve ranked chunks for a query, reporting any soft failures
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> RetrievalReport {
        let mut report = RetrievalReport::new(query);
        let top_k = self.resolve_k(k);

        report.load = self.store.ensure_loaded().await;
        let chunks = self.store.all().await;
        if chunks.is_empty() {
            debug!("Vector store is empty; nothing to retrieve");
            return report;
        }
        if top_k == 0 {
            return report;
        }

        let expansion = if query.trim().is_empty() {
            Expansion {
                terms: query.to_string(),
                fallback: None,
            }
        } else {
            expand_or_original(self.expander.as_ref(), query, self.settings.expand_timeout).await
        };

        debug!(terms = %expansion.terms, "Embedding search terms");
        let query_vector = match self.embed(&expansion.terms).await {
            Ok(vector) => vector,
            Err(e) => {
                error!("Query embedding failed, retrieving nothing: {}", e);
                report.expansion = Some(expansion);
                report.embedding_error = Some(e);
                return report;
            }
        };
        report.expansion = Some(expansion);

        report.results = rank(&query_vector, &chunks, top_k);
        info!(
            retrieved = report.results.len(),
            candidates = chunks.len(),
            top_k,
            "Retrieved relevant chunks"
        );
        report
    }

    /// Ranked chunks for a query; empty on any soft failure
    pub async fn retrieve_context(&self, query: &str, k: Option<usize>) -> Vec<ScoredChunk> {
        self.retrieve(query, k).await.results
    }
}
