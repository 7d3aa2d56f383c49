//! Embed command implementation

use crate::config::Config;
use crate::embed::create_embedder;
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EmbedResult {
    pub model: String,
    pub dimension: usize,
    pub normalized: bool,
    pub embedding: Vec<f32>,
}

/// Embed one text with the configured provider
pub async fn cmd_embed(config: &Config, text: &str) -> Result<EmbedResult> {
    let embedder = create_embedder(&config.embedding)?;
    let embedding = embedder.embed(text).await?;
    Ok(EmbedResult {
        model: embedder.model_name().to_string(),
        dimension: embedding.len(),
        normalized: embedder.normalizes(),
        embedding,
    })
}

pub fn print_embedding(result: &EmbedResult) {
    println!("Model: {}", result.model);
    println!(
        "Dimension: {}{}",
        result.dimension,
        if result.normalized { " (unit length)" } else { "" }
    );
    let head: Vec<String> = result
        .embedding
        .iter()
        .take(8)
        .map(|v| format!("{:.4}", v))
        .collect();
    let ellipsis = if result.dimension > head.len() { ", ..." } else { "" };
    println!("Vector: [{}{}]", head.join(", "), ellipsis);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cmd_embed_reports_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [2.0, 0.0, 0.0]})),
            )
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.embedding.url = format!("{}/embed", server.uri());

        let result = cmd_embed(&config, "Section 302").await.unwrap();
        assert_eq!(result.dimension, 3);
        assert_eq!(result.embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_cmd_embed_propagates_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.embedding.url = format!("{}/embed", server.uri());
        config.embedding.retries = 0;

        let err = cmd_embed(&config, "Section 302").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));

        let err = cmd_embed(&config, "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
