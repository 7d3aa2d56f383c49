//! Default values for configuration

use std::path::PathBuf;

/// Default snapshot path override (relative defaults are resolved against the base dir)
pub fn default_store_path() -> Option<PathBuf> {
    std::env::var("LEXRAG_STORE_PATH").ok().map(PathBuf::from)
}

/// Default embedding service endpoint
pub fn default_embedding_url() -> String {
    std::env::var("LEXRAG_EMBEDDING_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/embed".to_string())
}

/// Default local embedding model (mean-pooled sentence transformer)
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default: normalize embeddings to unit length
pub fn default_embedding_normalize() -> bool {
    true
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default number of retries for transient embedding failures
pub fn default_embedding_retries() -> usize {
    2
}

/// Default target chunk size in characters
pub fn default_chunk_target_chars() -> usize {
    1000
}

/// Default minimum chunk length; chunks this short or shorter are dropped
pub fn default_chunk_min_chars() -> usize {
    50
}

/// Default file extensions accepted by ingestion
pub fn default_chunk_extensions() -> Vec<String> {
    ["txt", "text", "md", "markdown"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// Default number of query results
pub fn default_query_k() -> usize {
    8
}

/// Default maximum query results
pub fn default_query_max_k() -> usize {
    50
}

/// Default query expansion timeout in seconds
pub fn default_expansion_timeout() -> u64 {
    10
}

/// Default environment variable holding the generative model API key
pub fn default_llm_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// Default generative model
pub fn default_llm_model() -> String {
    std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string())
}

/// Default generative model REST root
pub fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/".to_string()
}

/// Default sampling temperature
pub fn default_llm_temperature() -> f32 {
    0.7
}

/// Default output token budget
pub fn default_llm_max_output_tokens() -> u32 {
    4096
}

/// Default generative request timeout in seconds
pub fn default_llm_timeout() -> u64 {
    60
}
