//! Offline ingestion
//!
//! Reads a flat directory of text sources, chunks each file, embeds every
//! chunk and overwrites the vector store snapshot with the result.
//! Ingestion is best-effort: unreadable files and chunks that fail to embed
//! are reported and skipped, and a rerun from scratch is the recovery path.

use crate::chunk::chunk_text;
use crate::config::{ChunkConfig, Config};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::parse::{is_binary_content, is_supported_file};
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::store::{write_snapshot, Chunk, VectorStore};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A file that contributed no chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// A chunk left out of the snapshot because it could not be embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub source: String,
    pub index: usize,
    pub error: String,
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub source_dir: PathBuf,
    /// Snapshot written, or `None` when the directory was empty
    pub snapshot_path: Option<PathBuf>,
    pub files_processed: usize,
    pub files_skipped: Vec<SkippedFile>,
    pub chunks_written: usize,
    pub chunk_failures: Vec<ChunkFailure>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Chunks of one source file, not yet embedded
struct PendingFile {
    source: String,
    chunks: Vec<String>,
}

/// Batch ingester writing one snapshot file
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkConfig,
    snapshot_path: PathBuf,
    store: Option<Arc<VectorStore>>,
    show_progress: bool,
    embed_timeout: Duration,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, chunking: ChunkConfig, snapshot_path: PathBuf) -> Self {
        Self {
            embedder,
            chunking,
            snapshot_path,
            store: None,
            show_progress: false,
            embed_timeout: Config::default().embedding.timeout(),
        }
    }

    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(embedder, config.chunk.clone(), config.store_path())
            .with_embed_timeout(config.embedding.timeout())
    }

    /// Replace this store's contents after a successful write
    pub fn with_store(mut self, store: Arc<VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Upper bound on each chunk's embedding call
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Ingest every supported file directly under `dir`
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport> {
        if !dir.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{}: not a directory",
                dir.display()
            )));
        }

        info!("Ingesting directory: {}", dir.display());
        let mut report = IngestReport {
            source_dir: dir.to_path_buf(),
            ..Default::default()
        };

        let files = list_files(dir);
        if files.is_empty() {
            warn!("No files found in {}; snapshot left untouched", dir.display());
            return Ok(report);
        }

        let mut pending = Vec::new();
        for path in files {
            match self.read_and_chunk(&path).await {
                Ok(file) => {
                    report.files_processed += 1;
                    pending.push(file);
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", path.display(), reason);
                    report.files_skipped.push(SkippedFile { path, reason });
                }
            }
        }

        let total: usize = pending.iter().map(|f| f.chunks.len()).sum();
        info!(files = pending.len(), chunks = total, "Embedding chunks");

        let progress = if self.show_progress {
            start_progress_bar(total, "Embedding chunks")
        } else {
            None
        };

        let mut written = Vec::with_capacity(total);
        for file in pending {
            for (index, text) in file.chunks.into_iter().enumerate() {
                match self.embed_chunk(&text).await {
                    Ok(embedding) => {
                        written.push(Chunk::new(text, file.source.clone()).with_embedding(embedding));
                    }
                    Err(e) => {
                        error!(source = %file.source, index, "Failed to embed chunk: {}", e);
                        report.chunk_failures.push(ChunkFailure {
                            source: file.source.clone(),
                            index,
                            error: e.to_string(),
                        });
                    }
                }
                advance_progress(&progress);
            }
        }
        finish_progress(progress, "Chunks embedded");

        write_snapshot(&self.snapshot_path, &written).await?;
        report.chunks_written = written.len();
        report.snapshot_path = Some(self.snapshot_path.clone());

        if let Some(store) = &self.store {
            store.replace(written).await;
        }

        report.finished_at = Some(Utc::now());
        info!(
            "Ingestion complete: {} files, {} chunks written, {} failed",
            report.files_processed,
            report.chunks_written,
            report.chunk_failures.len()
        );
        Ok(report)
    }

    async fn embed_chunk(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::timeout(self.embed_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| Error::Timeout {
                operation: "embedding",
                secs: self.embed_timeout.as_secs(),
            })?
    }

    /// Chunk one file; `Err` carries the reason it was skipped
    async fn read_and_chunk(&self, path: &Path) -> std::result::Result<PendingFile, String> {
        if !is_supported_file(path, &self.chunking.extensions) {
            debug!("Skipping non-text file: {}", path.display());
            return Err("unsupported file type".to_string());
        }

        let content = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
        if is_binary_content(&content) {
            return Err("binary content".to_string());
        }

        let text = String::from_utf8_lossy(&content);
        let chunks: Vec<String> = chunk_text(&text, &self.chunking)
            .into_iter()
            .map(|c| c.text)
            .collect();
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(source = %source, chunks = chunks.len(), "Chunked file");
        Ok(PendingFile { source, chunks })
    }
}

/// Files directly under `dir`, sorted by name
///
/// Hidden files, ignore-file rules and symlinks get no special treatment;
/// every entry reaches the supported-type check.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .collect()
}
