//! Status command implementation

use crate::config::{Config, EmbeddingBackendKind, ExpansionMode};
use crate::embedding_backend::EmbeddingBackendClient;
use crate::error::Result;
use crate::store::{LoadOutcome, StoreStats, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Embedding service reachability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub checked: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub config_exists: bool,
    pub store_path: String,
    pub store_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    pub store: StoreStats,
    pub embedding_backend: String,
    pub embedding_url: String,
    pub normalize: bool,
    pub embedding_health: ServiceHealth,
    pub expansion_mode: String,
    pub llm_model: String,
    pub llm_configured: bool,
}

/// Get system status
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let store = VectorStore::new(config.store_path());
    let (store_exists, store_error) = match store.load().await {
        LoadOutcome::Loaded(_) => (true, None),
        LoadOutcome::Missing => (false, None),
        LoadOutcome::Failed(e) => (true, Some(e.to_string())),
    };

    let embedding_health = match config.embedding.backend {
        EmbeddingBackendKind::Http => check_embedding_service(config).await,
        EmbeddingBackendKind::Local => ServiceHealth::default(),
    };

    let expansion_mode = match config.expansion.mode {
        ExpansionMode::Llm => "llm",
        ExpansionMode::None => "none",
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        config_exists: config.paths.config_file.exists(),
        store_path: store.path().display().to_string(),
        store_exists,
        store_error,
        store: store.stats().await,
        embedding_backend: config.embedding.backend.to_string(),
        embedding_url: config.embedding.url.clone(),
        normalize: config.embedding.normalize,
        embedding_health,
        expansion_mode: expansion_mode.to_string(),
        llm_model: config.llm.model.clone(),
        llm_configured: config.llm.api_key().is_some(),
    })
}

async fn check_embedding_service(config: &Config) -> ServiceHealth {
    let mut embedding = config.embedding.clone();
    embedding.retries = 0;

    let result = match EmbeddingBackendClient::new(&embedding) {
        Ok(client) => client.health().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(health) => ServiceHealth {
            checked: true,
            reachable: true,
            status: Some(health.status.clone()),
            model: health.model,
            error: None,
        },
        Err(e) => {
            debug!("Embedding service health check failed: {:?}", e);
            ServiceHealth {
                checked: true,
                reachable: false,
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 lexrag Status\n");
    let config_note = if status.config_exists { "" } else { " (defaults, run 'lexrag init')" };
    println!("Configuration: {}{}", status.config_path, config_note);

    println!("\nVector store:");
    println!("  Path: {}", status.store_path);
    let store_state = match (&status.store_error, status.store_exists) {
        (Some(error), _) => format!("✗ Unreadable: {}", error),
        (None, true) => "✓ Loaded".to_string(),
        (None, false) => "⚠ Missing (run 'lexrag ingest <dir>')".to_string(),
    };
    println!("  Status: {}", store_state);
    println!("  Chunks: {} ({} embedded)", status.store.chunks, status.store.embedded);
    println!("  Sources: {}", status.store.sources);
    if !status.store.dimensions.is_empty() {
        let dims: Vec<String> = status.store.dimensions.iter().map(|d| d.to_string()).collect();
        let mixed = if dims.len() > 1 { " ⚠ mixed" } else { "" };
        println!("  Dimensions: {}{}", dims.join(", "), mixed);
    }

    println!("\nEmbedding:");
    println!("  Backend: {}", status.embedding_backend);
    println!("  Normalize: {}", status.normalize);
    if status.embedding_health.checked {
        println!("  URL: {}", status.embedding_url);
        let health = &status.embedding_health;
        if health.reachable {
            println!(
                "  Service: ✓ {} ({})",
                health.status.as_deref().unwrap_or("ok"),
                health.model.as_deref().unwrap_or("unknown model")
            );
        } else {
            println!(
                "  Service: ✗ Unreachable: {}",
                health.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!("\nQuery expansion: {}", status.expansion_mode);
    let llm_state = if status.llm_configured { "✓ API key set" } else { "✗ No API key" };
    println!("Generative model: {} ({})", status.llm_model, llm_state);
}
