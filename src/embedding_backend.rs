use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "detail", alias = "message")]
    error: String,
}

/// Reply of the embedding service health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Client for the single-text embedding microservice
pub struct EmbeddingBackendClient {
    client: Client,
    embed_url: Url,
    health_url: Url,
    retries: usize,
}

impl EmbeddingBackendClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let embed_url = Url::parse(&config.url)?;
        let health_url = config.resolved_health_url()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            embed_url,
            health_url,
            retries: config.retries,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.embed_url
    }

    async fn send_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut last_err: Option<Error> = None;
        for attempt in 0..=self.retries {
            let req = request.try_clone().ok_or_else(|| {
                Error::Embedding("Failed to clone backend request".to_string())
            })?;
            match req.send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| Error::Embedding(format!("Malformed response: {}", e)));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let err = Error::Embedding(describe_failure(status, &body));
                    if !status.is_server_error() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => last_err = Some(Error::Embedding(e.to_string())),
            }

            if attempt < self.retries {
                warn!(attempt = attempt + 1, retries = self.retries, "Retrying embedding request");
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::Embedding("Embedding backend request failed".to_string())
        }))
    }

    /// Embed one text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(chars = text.chars().count(), "Requesting embedding");
        let request = self
            .client
            .post(self.embed_url.clone())
            .json(&EmbedRequest { text });
        let parsed: EmbedResponse = self.send_with_retry(request).await?;
        Ok(parsed.embedding)
    }

    /// Query the health endpoint
    pub async fn health(&self) -> Result<HealthStatus> {
        let request = self.client.get(self.health_url.clone());
        self.send_with_retry(request).await
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => format!("{}: {}", status, parsed.error),
        Err(_) if body.trim().is_empty() => format!("{}", status),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}
