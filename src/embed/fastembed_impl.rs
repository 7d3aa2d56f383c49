//! FastEmbed implementation for local embeddings

use super::{validate_text, Embedder, EmbeddingContract, LazyModel};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;
use tracing::debug;

/// Map a configured model id to a fastembed model and its dimension
pub fn local_model_for(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name {
        "sentence-transformers/all-MiniLM-L6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "sentence-transformers/all-MiniLM-L12-v2" => Some((EmbeddingModel::AllMiniLML12V2, 384)),
        "BAAI/bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "BAAI/bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "BAAI/bge-large-en-v1.5" => Some((EmbeddingModel::BGELargeENV15, 1024)),
        _ => None,
    }
}

/// In-process embedder; the model is fetched and loaded on first use
pub struct LocalEmbedder {
    model: LazyModel<Mutex<TextEmbedding>>,
    model_name: String,
    contract: EmbeddingContract,
}

impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_enum, known_dimension) = local_model_for(&config.model).ok_or_else(|| {
            Error::Config(format!(
                "Unsupported local embedding model '{}'",
                config.model
            ))
        })?;

        if let Some(dimension) = config.dimension {
            if dimension != known_dimension {
                return Err(Error::Config(format!(
                    "embedding.dimension = {} does not match model '{}' ({})",
                    dimension, config.model, known_dimension
                )));
            }
        }

        let model = LazyModel::new(config.model.clone(), move || {
            let options = InitOptions::new(model_enum.clone()).with_show_download_progress(true);
            let model = TextEmbedding::try_new(options)
                .map_err(|e| Error::Embedding(format!("Failed to initialize model: {}", e)))?;
            Ok(Mutex::new(model))
        });

        let mut contract = EmbeddingContract::from_config(config);
        contract.dimension = Some(known_dimension);

        Ok(Self {
            model,
            model_name: config.model.clone(),
            contract,
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;
        let model = self.model.get().await?;

        debug!(chars = text.chars().count(), "Embedding text locally");

        // FastEmbed is synchronous, so we wrap in blocking task
        let input = vec![text.to_string()];
        let mut embeddings = tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            model.embed(input, None)
        })
        .await
        .map_err(|e| Error::Embedding(format!("Task join error: {}", e)))?
        .map_err(|e| Error::Embedding(format!("Embedding failed: {}", e)))?;

        let raw = embeddings
            .pop()
            .ok_or_else(|| Error::Embedding("Model returned no embedding".to_string()))?;
        self.contract.finish(&self.model_name, raw)
    }

    fn dimension(&self) -> Option<usize> {
        self.contract.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn normalizes(&self) -> bool {
        self.contract.normalize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_dimensions() {
        assert_eq!(
            local_model_for("sentence-transformers/all-MiniLM-L6-v2").map(|(_, d)| d),
            Some(384)
        );
        assert_eq!(
            local_model_for("BAAI/bge-base-en-v1.5").map(|(_, d)| d),
            Some(768)
        );
        assert!(local_model_for("law-ai/InLegalBERT").is_none());
    }

    #[test]
    fn test_construction_does_not_load_model() {
        let embedder = LocalEmbedder::new(&EmbeddingConfig::default()).unwrap();
        assert!(!embedder.model.is_loaded());
        assert_eq!(embedder.dimension(), Some(384));
    }

    #[test]
    fn test_dimension_conflict_rejected() {
        let config = EmbeddingConfig {
            dimension: Some(768),
            ..Default::default()
        };
        assert!(matches!(LocalEmbedder::new(&config), Err(Error::Config(_))));
    }

    // Integration test - requires model download
    #[tokio::test]
    #[ignore] // Run manually with: cargo test --features local-embed -- --ignored
    async fn test_local_embedding_is_unit_length() {
        let embedder = LocalEmbedder::new(&EmbeddingConfig::default()).unwrap();
        let embedding = embedder.embed("Punishment for theft").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
