use super::{validate_text, Embedder, EmbeddingContract};
use crate::config::EmbeddingConfig;
use crate::embedding_backend::{EmbeddingBackendClient, HealthStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Embedder backed by the remote embedding microservice
pub struct HttpEmbedder {
    client: EmbeddingBackendClient,
    model_name: String,
    contract: EmbeddingContract,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingBackendClient::new(config)?;
        Ok(Self {
            model_name: client.endpoint().to_string(),
            client,
            contract: EmbeddingContract::from_config(config),
        })
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.client.health().await
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;
        let raw = self.client.embed(text).await?;
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
