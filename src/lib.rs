//! lexrag: retrieval core for a legal assistant
//!
//! Chunks a corpus of legal texts, embeds each chunk, keeps the vectors in a
//! JSON snapshot and answers top-K similarity queries, optionally rewriting the
//! query into legal keywords first.

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod embedding_backend;
pub mod error;
pub mod expand;
pub mod ingest;
pub mod llm;
pub mod parse;
pub mod progress;
pub mod prompt;
pub mod rank;
pub mod retrieve;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
