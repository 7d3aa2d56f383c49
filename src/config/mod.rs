//! Configuration management for lexrag
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vector store snapshot configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Query expansion configuration
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Generative model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file; relative paths resolve against the base directory
    #[serde(default = "default_store_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Which embedding provider to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    /// Remote embedding microservice
    #[serde(alias = "https", alias = "python-sidecar")]
    Http,
    /// In-process model (requires the `local-embed` feature)
    Local,
}

impl std::fmt::Display for EmbeddingBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingBackendKind::Http => write!(f, "http"),
            EmbeddingBackendKind::Local => write!(f, "local"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider kind
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackendKind,

    /// Embedding service endpoint (POST {"text"} -> {"embedding"})
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Health endpoint; derived from `url` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,

    /// Model identifier for the local backend
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected dimension; enforced on every vector when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// L2-normalize every vector so dot product equals cosine similarity
    #[serde(default = "default_embedding_normalize")]
    pub normalize: bool,

    /// Per-call timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Retries for transport errors and 5xx responses
    #[serde(default = "default_embedding_retries")]
    pub retries: usize,
}

fn default_embedding_backend() -> EmbeddingBackendKind {
    EmbeddingBackendKind::Http
}

impl EmbeddingConfig {
    /// Health endpoint of the embedding service
    pub fn resolved_health_url(&self) -> Result<Url> {
        match &self.health_url {
            Some(explicit) => Ok(Url::parse(explicit)?),
            None => Ok(Url::parse(&self.url)?.join("health")?),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target characters per chunk
    #[serde(default = "default_chunk_target_chars")]
    pub target_chars: usize,

    /// Chunks whose trimmed length is not above this are dropped
    #[serde(default = "default_chunk_min_chars")]
    pub min_chars: usize,

    /// File extensions picked up by ingestion
    #[serde(default = "default_chunk_extensions")]
    pub extensions: Vec<String>,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default number of results
    #[serde(default = "default_query_k")]
    pub default_k: usize,

    /// Maximum results allowed
    #[serde(default = "default_query_max_k")]
    pub max_k: usize,
}

/// Query expansion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionMode {
    /// Rewrite queries with the generative model
    Llm,
    /// Search with the query as typed
    None,
}

/// Query expansion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default = "default_expansion_mode")]
    pub mode: ExpansionMode,

    /// Per-call timeout in seconds
    #[serde(default = "default_expansion_timeout")]
    pub timeout_secs: u64,
}

fn default_expansion_mode() -> ExpansionMode {
    ExpansionMode::Llm
}

impl ExpansionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Environment variable name for the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// REST root of the generative API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Sampling temperature for answers
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    /// Output token budget for answers
    #[serde(default = "default_llm_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Get the API key from the environment; blank values count as missing
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for lexrag data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            url: default_embedding_url(),
            health_url: None,
            model: default_embedding_model(),
            dimension: None,
            normalize: default_embedding_normalize(),
            timeout_secs: default_embedding_timeout(),
            retries: default_embedding_retries(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_chars: default_chunk_target_chars(),
            min_chars: default_chunk_min_chars(),
            extensions: default_chunk_extensions(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_query_k(),
            max_k: default_query_max_k(),
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            mode: default_expansion_mode(),
            timeout_secs: default_expansion_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_api_key_env(),
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            temperature: default_llm_temperature(),
            max_output_tokens: default_llm_max_output_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Config {
    /// Get the default base directory for lexrag (~/.lexrag)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lexrag")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Snapshot file location
    pub fn store_path(&self) -> PathBuf {
        match &self.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.paths.base_dir.join(path),
            None => self.paths.base_dir.join("data").join("vectors.json"),
        }
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.target_chars == 0 {
            return Err(Error::Config(
                "chunk.target_chars must be positive".to_string(),
            ));
        }

        if self.chunk.min_chars >= self.chunk.target_chars {
            return Err(Error::Config(
                "chunk.min_chars must be < chunk.target_chars".to_string(),
            ));
        }

        if self.query.default_k == 0 {
            return Err(Error::Config("query.default_k must be positive".to_string()));
        }

        if self.query.default_k > self.query.max_k {
            return Err(Error::Config(
                "query.default_k must be <= query.max_k".to_string(),
            ));
        }

        if self.embedding.dimension == Some(0) {
            return Err(Error::Config(
                "embedding.dimension must be positive when set".to_string(),
            ));
        }

        if self.embedding.timeout_secs == 0
            || self.expansion.timeout_secs == 0
            || self.llm.timeout_secs == 0
        {
            return Err(Error::Config("timeouts must be positive".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk.target_chars, 1000);
        assert_eq!(config.chunk.min_chars, 50);
        assert_eq!(config.query.default_k, 8);
        assert_eq!(config.embedding.backend, EmbeddingBackendKind::Http);
        assert!(config.embedding.normalize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.query.default_k = 5;
        config.expansion.mode = ExpansionMode::None;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.query.default_k, 5);
        assert_eq!(loaded.expansion.mode, ExpansionMode::None);

        let direct = Config::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(direct.paths.base_dir, tmp.path());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [embedding]
            backend = "python-sidecar"
            dimension = 768

            [expansion]
            mode = "none"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.embedding.backend, EmbeddingBackendKind::Http);
        assert_eq!(parsed.embedding.dimension, Some(768));
        assert_eq!(parsed.expansion.mode, ExpansionMode::None);
        assert_eq!(parsed.chunk.target_chars, 1000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.chunk.min_chars = config.chunk.target_chars;
        assert!(config.validate().is_err());
        config.chunk.min_chars = 50;
        assert!(config.validate().is_ok());

        config.query.default_k = config.query.max_k + 1;
        assert!(config.validate().is_err());
        config.query.default_k = 8;

        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
        config.llm.temperature = 0.7;

        config.embedding.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_path_resolution() {
        let mut config = Config::default();
        config.init_paths(Some(PathBuf::from("/srv/lexrag")));

        config.store.path = None;
        assert_eq!(
            config.store_path(),
            PathBuf::from("/srv/lexrag/data/vectors.json")
        );

        config.store.path = Some(PathBuf::from("corpus/ipc.json"));
        assert_eq!(config.store_path(), PathBuf::from("/srv/lexrag/corpus/ipc.json"));

        config.store.path = Some(PathBuf::from("/var/vectors.json"));
        assert_eq!(config.store_path(), PathBuf::from("/var/vectors.json"));
    }

    #[test]
    fn test_health_url_derived_from_embed_url() {
        let mut embedding = EmbeddingConfig {
            url: "http://127.0.0.1:8000/embed".to_string(),
            ..Default::default()
        };
        assert_eq!(
            embedding.resolved_health_url().unwrap().as_str(),
            "http://127.0.0.1:8000/health"
        );

        embedding.health_url = Some("http://10.0.0.2:9000/status".to_string());
        assert_eq!(
            embedding.resolved_health_url().unwrap().as_str(),
            "http://10.0.0.2:9000/status"
        );
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let llm = LlmConfig {
            api_key_env: "LEXRAG_TEST_BLANK_API_KEY".to_string(),
            ..Default::default()
        };
        std::env::set_var("LEXRAG_TEST_BLANK_API_KEY", "   ");
        assert!(llm.api_key().is_none());
        std::env::set_var("LEXRAG_TEST_BLANK_API_KEY", " abc ");
        assert_eq!(llm.api_key().as_deref(), Some("abc"));
    }
}
