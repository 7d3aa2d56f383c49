//! Ingest command implementation

use crate::config::Config;
use crate::embed::create_embedder;
use crate::error::Result;
use crate::ingest::{IngestReport, Ingestor};
use std::path::Path;

/// Ingest a local directory into the configured snapshot
pub async fn cmd_ingest(config: &Config, dir: &Path, show_progress: bool) -> Result<IngestReport> {
    let embedder = create_embedder(&config.embedding)?;
    Ingestor::from_config(config, embedder)
        .with_progress(show_progress)
        .ingest(dir)
        .await
}

/// Print ingestion report to console
pub fn print_ingest_report(report: &IngestReport) {
    println!("\n📥 Ingested {}\n", report.source_dir.display());

    match &report.snapshot_path {
        Some(path) => println!("Snapshot: {}", path.display()),
        None => {
            println!("No files found; existing snapshot left untouched.");
            return;
        }
    }

    println!("Files processed: {}", report.files_processed);
    println!("Chunks written: {}", report.chunks_written);

    if !report.files_skipped.is_empty() {
        println!("\nSkipped files:");
        for skipped in &report.files_skipped {
            println!("  • {} ({})", skipped.path.display(), skipped.reason);
        }
    }

    if !report.chunk_failures.is_empty() {
        println!("\n⚠ {} chunks failed to embed:", report.chunk_failures.len());
        for failure in &report.chunk_failures {
            println!("  • {} #{}: {}", failure.source, failure.index, failure.error);
        }
        println!("Rerun ingestion once the embedding service is healthy.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cmd_ingest_against_embedding_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embedding": [1.0, 1.0]})),
            )
            .mount(&server)
            .await;

        let base = TempDir::new().unwrap();
        let raw = TempDir::new().unwrap();
        std::fs::write(
            raw.path().join("ipc.txt"),
            "Section 379. Whoever commits theft shall be punished with imprisonment of either description.",
        )
        .unwrap();

        let mut config = Config::default();
        config.init_paths(Some(base.path().to_path_buf()));
        config.embedding.url = format!("{}/embed", server.uri());

        let report = cmd_ingest(&config, raw.path(), false).await.unwrap();
        assert_eq!(report.chunks_written, 1);
        assert_eq!(report.snapshot_path, Some(config.store_path()));
        assert!(config.store_path().exists());
    }
}
