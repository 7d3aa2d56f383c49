//! Query command implementation

use crate::config::Config;
use crate::error::Result;
use crate::expand::NullExpander;
use crate::rank::ScoredChunk;
use crate::retrieve::{RetrievalReport, RetrievalService};
use crate::store::LoadOutcome;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Number of results to return
    pub k: Option<usize>,
    /// Search with the query as typed
    pub no_expand: bool,
}

/// Query result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub search_terms: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansion_fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_error: Option<String>,
    pub total_chunks: usize,
    pub results: Vec<ScoredChunk>,
}

impl QueryResult {
    pub fn from_report(report: RetrievalReport, total_chunks: usize) -> Self {
        let store_warning = match &report.load {
            Some(LoadOutcome::Missing) => Some("no vector store snapshot found".to_string()),
            Some(LoadOutcome::Failed(e)) => Some(e.to_string()),
            Some(LoadOutcome::Loaded(_)) | None => None,
        };
        Self {
            search_terms: report.search_terms().to_string(),
            expansion_fallback: report.expansion.as_ref().and_then(|e| e.fallback_reason()),
            store_warning,
            embedding_error: report.embedding_error.as_ref().map(|e| e.to_string()),
            query: report.query,
            total_chunks,
            results: report.results,
        }
    }
}

/// Execute a query
pub async fn cmd_query(config: &Config, query: &str, options: QueryOptions) -> Result<QueryResult> {
    info!("Querying: {}", query);

    let mut service = RetrievalService::from_config(config)?;
    if options.no_expand {
        service = service.with_expander(Arc::new(NullExpander));
    }

    let report = service.retrieve(query, options.k).await;
    let total_chunks = service.store().len().await;
    Ok(QueryResult::from_report(report, total_chunks))
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    match flat.char_indices().nth(max_chars) {
        Some((offset, _)) => format!("{}...", flat[..offset].trim_end()),
        None => flat,
    }
}

/// Print query results to console
pub fn print_query_results(result: &QueryResult) {
    println!("\n🔍 Query: {}", result.query);
    if result.search_terms != result.query {
        println!("   Search terms: {}", result.search_terms);
    }
    if let Some(reason) = &result.expansion_fallback {
        println!("   ⚠ Expansion skipped: {}", reason);
    }
    if let Some(warning) = &result.store_warning {
        println!("   ⚠ Vector store: {}", warning);
    }
    if let Some(error) = &result.embedding_error {
        println!("   ✗ Query embedding failed: {}", error);
    }

    println!(
        "\nFound {} results in {} chunks:\n",
        result.results.len(),
        result.total_chunks
    );

    for (i, r) in result.results.iter().enumerate() {
        println!("{}. [score: {:.3}] {} ({})", i + 1, r.score, r.chunk.source, r.chunk.kind);
        println!("   {}\n", preview(&r.chunk.text, 200));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpansionMode;
    use crate::store::{write_snapshot, Chunk};
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("short\ntext", 200), "short text");
        assert_eq!(preview("धारा धारा", 4), "धारा...");
    }

    #[tokio::test]
    async fn test_cmd_query_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(serde_json::json!({"text": "theft"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embedding": [0.0, 2.0]})),
            )
            .mount(&server)
            .await;

        let base = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(base.path().to_path_buf()));
        config.embedding.url = format!("{}/embed", server.uri());
        config.expansion.mode = ExpansionMode::None;

        write_snapshot(
            &config.store_path(),
            &[
                Chunk::new("Cheating and dishonestly inducing delivery.", "ipc.txt")
                    .with_embedding(vec![1.0, 0.0]),
                Chunk::new("Punishment for theft.", "ipc.txt").with_embedding(vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

        let result = cmd_query(&config, "theft", QueryOptions { k: Some(1), no_expand: false })
            .await
            .unwrap();

        assert_eq!(result.total_chunks, 2);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].chunk.text, "Punishment for theft.");
        assert!((result.results[0].score - 1.0).abs() < 1e-6);
        assert!(result.embedding_error.is_none());
    }

    #[tokio::test]
    async fn test_cmd_query_without_snapshot_is_empty() {
        let base = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(base.path().to_path_buf()));
        config.expansion.mode = ExpansionMode::None;

        let result = cmd_query(&config, "bail", QueryOptions::default()).await.unwrap();
        assert!(result.results.is_empty());
        assert!(result.store_warning.is_some());
    }
}
