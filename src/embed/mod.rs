//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - HTTP embedding backend (single-text microservice)
//! - In-process FastEmbed backend behind the `local-embed` feature
//!
//! Every backend applies the same output contract: vectors match the
//! configured dimension when one is set, and are L2-normalized when
//! `embedding.normalize` is on, so a dot product is a cosine similarity.

mod http_backend;
mod lazy;

#[cfg(feature = "local-embed")]
mod fastembed_impl;

pub use http_backend::*;
pub use lazy::*;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;

use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub fn normalize_embedding(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Reject text that cannot be embedded
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput(
            "text to embed must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

/// Output contract shared by all backends
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingContract {
    pub dimension: Option<usize>,
    pub normalize: bool,
}

impl EmbeddingContract {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            dimension: config.dimension,
            normalize: config.normalize,
        }
    }

    /// Validate a raw vector and apply normalization
    pub fn finish(&self, model: &str, raw: Vec<f32>) -> Result<Vec<f32>> {
        if raw.is_empty() {
            return Err(Error::Embedding(format!(
                "Model '{}' returned an empty embedding",
                model
            )));
        }
        if let Some(expected) = self.dimension {
            if raw.len() != expected {
                return Err(Error::Embedding(format!(
                    "Embedding dimension mismatch for model '{}': expected {}, got {}",
                    model,
                    expected,
                    raw.len()
                )));
            }
        }
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(Error::Embedding(format!(
                "Model '{}' returned a non-finite embedding",
                model
            )));
        }
        Ok(if self.normalize {
            normalize_embedding(&raw)
        } else {
            raw
        })
    }
}

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension, when known up front
    fn dimension(&self) -> Option<usize>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Whether outputs are unit length
    fn normalizes(&self) -> bool;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackendKind::Http => Ok(Arc::new(HttpEmbedder::new(config)?)),
        #[cfg(feature = "local-embed")]
        EmbeddingBackendKind::Local => Ok(Arc::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingBackendKind::Local => Err(Error::Config(
            "embedding.backend = \"local\" requires building with the `local-embed` feature"
                .to_string(),
        )),
    }
}
