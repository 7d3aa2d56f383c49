//! Snapshot-backed vector store
//!
//! This module provides:
//! - The persisted `Chunk` record (`{text, source, type, embedding}`)
//! - Whole-file JSON snapshot read/write
//! - An in-memory store that is only ever replaced wholesale
//!
//! Readers take an `Arc` snapshot of the chunk list and score it without
//! holding the lock, so a reload or ingestion can swap the list while
//! queries are in flight.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Classification tag used when a record carries none
pub const DEFAULT_CHUNK_TYPE: &str = "General";

fn default_chunk_type() -> String {
    DEFAULT_CHUNK_TYPE.to_string()
}

/// A unit of retrievable content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,

    /// Originating document (file name or logical name)
    #[serde(default)]
    pub source: String,

    /// Free-form classification tag
    #[serde(rename = "type", default = "default_chunk_type")]
    pub kind: String,

    /// Absent when embedding failed; such chunks are never ranked
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            kind: default_chunk_type(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// What happened when the snapshot was (re)loaded
#[derive(Debug)]
pub enum LoadOutcome {
    /// Snapshot read; holds the number of chunks now in memory
    Loaded(usize),
    /// No snapshot file; the store is empty
    Missing,
    /// Snapshot unreadable or unparsable; the store is empty
    Failed(Error),
}

impl LoadOutcome {
    pub fn chunk_count(&self) -> usize {
        match self {
            LoadOutcome::Loaded(count) => *count,
            LoadOutcome::Missing | LoadOutcome::Failed(_) => 0,
        }
    }
}

/// Summary of the store contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub chunks: usize,
    pub embedded: usize,
    pub sources: usize,
    /// Distinct embedding lengths seen; more than one means a mixed corpus
    pub dimensions: Vec<usize>,
}

/// In-memory chunk list mirrored to a snapshot file
pub struct VectorStore {
    path: PathBuf,
    chunks: RwLock<Arc<Vec<Chunk>>>,
}

impl VectorStore {
    /// Create an empty store backed by `path`; nothing is read yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunks: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Create a store pre-populated with chunks
    pub fn with_chunks(path: impl Into<PathBuf>, chunks: Vec<Chunk>) -> Self {
        Self {
            path: path.into(),
            chunks: RwLock::new(Arc::new(chunks)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory contents with the snapshot file
    ///
    /// Never fails: a missing file or a bad snapshot leaves the store empty
    /// and is reported through the returned outcome.
    pub async fn load(&self) -> LoadOutcome {
        let mut guard = self.chunks.write().await;
        self.load_into(&mut guard).await
    }

    /// Load the snapshot only if the store is currently empty
    ///
    /// Returns `None` when the store already held chunks. Concurrent callers
    /// serialize on the write lock, so one empty store triggers one read.
    pub async fn ensure_loaded(&self) -> Option<LoadOutcome> {
        if !self.chunks.read().await.is_empty() {
            return None;
        }

        let mut guard = self.chunks.write().await;
        if !guard.is_empty() {
            return None;
        }
        Some(self.load_into(&mut guard).await)
    }

    async fn load_into(&self, slot: &mut Arc<Vec<Chunk>>) -> LoadOutcome {
        match read_snapshot(&self.path).await {
            Ok(Some(chunks)) => {
                let count = chunks.len();
                info!(path = %self.path.display(), count, "Loaded vector store");
                *slot = Arc::new(chunks);
                LoadOutcome::Loaded(count)
            }
            Ok(None) => {
                warn!(path = %self.path.display(), "No vector store found");
                *slot = Arc::new(Vec::new());
                LoadOutcome::Missing
            }
            Err(e) => {
                error!(path = %self.path.display(), "Failed to load vector store: {}", e);
                *slot = Arc::new(Vec::new());
                LoadOutcome::Failed(e)
            }
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// Read-only view of the current chunk list, in store order
    pub async fn all(&self) -> Arc<Vec<Chunk>> {
        Arc::clone(&*self.chunks.read().await)
    }

    /// Swap in a new chunk list
    pub async fn replace(&self, chunks: Vec<Chunk>) {
        let count = chunks.len();
        *self.chunks.write().await = Arc::new(chunks);
        debug!(count, "Replaced in-memory vector store");
    }

    pub async fn stats(&self) -> StoreStats {
        let chunks = self.all().await;
        let dimensions: BTreeSet<usize> = chunks
            .iter()
            .filter_map(|c| c.embedding.as_ref().map(Vec::len))
            .collect();
        let sources: BTreeSet<&str> = chunks.iter().map(|c| c.source.as_str()).collect();

        StoreStats {
            chunks: chunks.len(),
            embedded: chunks.iter().filter(|c| c.embedding.is_some()).count(),
            sources: sources.len(),
            dimensions: dimensions.into_iter().collect(),
        }
    }
}

/// Read a snapshot file; `Ok(None)` when the file does not exist
pub async fn read_snapshot(path: &Path) -> Result<Option<Vec<Chunk>>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::StoreLoad(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let chunks: Vec<Chunk> = serde_json::from_str(&raw).map_err(|e| {
        Error::StoreLoad(format!("invalid snapshot {}: {}", path.display(), e))
    })?;
    Ok(Some(chunks))
}

/// Overwrite the snapshot file with `chunks`
///
/// The new contents go to a sibling temp file first and are renamed into
/// place, so readers never observe a half-written snapshot.
pub async fn write_snapshot(path: &Path, chunks: &[Chunk]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_string_pretty(chunks)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    info!(path = %path.display(), count = chunks.len(), "Wrote vector store snapshot");
    Ok(())
}
