//! Query expansion
//!
//! Rewrites a casual question into legal search terms before embedding.
//! Expansion only improves recall; every failure path falls back to the
//! query as typed.

use crate::config::{Config, ExpansionMode};
use crate::error::{Error, Result};
use crate::llm::{create_generative_model, GenerationRequest, GenerativeModel};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Trait for query rewriters
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Rewrite `query` into search terms
    async fn expand(&self, query: &str) -> Result<String>;

    /// Short label for logs and status output
    fn name(&self) -> &str;
}

/// Expander that searches with the query unchanged
pub struct NullExpander;

#[async_trait]
impl QueryExpander for NullExpander {
    async fn expand(&self, query: &str) -> Result<String> {
        Ok(query.to_string())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Build the keyword-translation prompt for a user query
pub fn expansion_prompt(query: &str) -> String {
    format!(
        "You are a legal search assistant.\n\
         Translate the following casual user query into specific Indian legal keywords and section numbers for vector search.\n\
         \n\
         User Query: \"{query}\"\n\
         \n\
         Output ONLY a single line of keywords/sections.\n\
         Example: \"I hit someone with car\" -> \"Section 279 IPC rash driving Section 304A IPC death by negligence road accident\"\n\
         \n\
         Keywords:"
    )
}

/// Reduce a model reply to a single line of search terms
///
/// Lines that hold nothing but the `Keywords:` label or quotes are skipped.
pub fn clean_expansion(raw: &str) -> Option<String> {
    raw.lines()
        .map(clean_line)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    let line = match line.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("keywords:") => line[9..].trim(),
        _ => line,
    };
    line.trim_matches(|c| c == '"' || c == '\'' || c == '`').trim()
}

/// Expander backed by a generative model
pub struct LlmQueryExpander {
    model: Arc<dyn GenerativeModel>,
}

impl LlmQueryExpander {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, query: &str) -> Result<String> {
        let request = GenerationRequest::new(expansion_prompt(query));
        let reply = self
            .model
            .generate(&request)
            .await
            .map_err(|e| Error::Expansion(e.to_string()))?;

        clean_expansion(&reply)
            .ok_or_else(|| Error::Expansion("model returned no search terms".to_string()))
    }

    fn name(&self) -> &str {
        self.model.model_name()
    }
}

/// Terms actually searched for a query
#[derive(Debug)]
pub struct Expansion {
    pub terms: String,
    /// Why the original query was used instead, if expansion failed
    pub fallback: Option<Error>,
}

impl Expansion {
    pub fn is_expanded(&self, query: &str) -> bool {
        self.fallback.is_none() && self.terms != query
    }

    pub fn fallback_reason(&self) -> Option<String> {
        self.fallback.as_ref().map(|e| e.to_string())
    }
}

/// Expand a query, falling back to the original on failure or timeout
pub async fn expand_or_original(
    expander: &dyn QueryExpander,
    query: &str,
    timeout: Duration,
) -> Expansion {
    let outcome = match tokio::time::timeout(timeout, expander.expand(query)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: "query expansion",
            secs: timeout.as_secs(),
        }),
    };

    match outcome {
        Ok(terms) => {
            if terms != query {
                info!(query, expanded = %terms, "Expanded query");
            }
            Expansion {
                terms,
                fallback: None,
            }
        }
        Err(e) => {
            warn!(expander = expander.name(), "Query expansion failed, using original: {}", e);
            Expansion {
                terms: query.to_string(),
                fallback: Some(e),
            }
        }
    }
}

/// Create the configured expander
///
/// `mode = "llm"` without an API key degrades to the null expander.
pub fn create_expander(config: &Config) -> Result<Arc<dyn QueryExpander>> {
    match config.expansion.mode {
        ExpansionMode::None => Ok(Arc::new(NullExpander)),
        ExpansionMode::Llm => match create_generative_model(&config.llm)? {
            Some(model) => Ok(Arc::new(LlmQueryExpander::new(model))),
            None => {
                warn!("No generative model available; query expansion disabled");
                Ok(Arc::new(NullExpander))
            }
        },
    }
}
