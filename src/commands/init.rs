//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    /// Config file name other than `<base_dir>/config.toml`
    pub config_file: Option<PathBuf>,
    pub force: bool,
}

impl InitOptions {
    /// Resolve a `--config` argument naming either a `.toml` file or a directory
    pub fn from_config_arg(config: Option<&Path>, force: bool) -> Self {
        let (base_dir, config_file) = match config {
            Some(path) if path.extension().is_some_and(|e| e == "toml") => {
                let base = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                (base, Some(path.to_path_buf()))
            }
            Some(path) => (path.to_path_buf(), None),
            None => (Config::default_base_dir(), None),
        };
        Self {
            base_dir,
            config_file,
            force,
        }
    }
}

/// What `init` created
#[derive(Debug, Clone, Serialize)]
pub struct InitInfo {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub store_path: PathBuf,
    pub overwritten: bool,
}

/// Write a default configuration and create the data directory
pub async fn cmd_init(options: InitOptions) -> Result<InitInfo> {
    let InitOptions {
        base_dir,
        config_file,
        force,
    } = options;

    let mut config = Config::default();
    config.init_paths(Some(base_dir));
    if let Some(file) = config_file {
        config.paths.config_file = file;
    }

    let exists = config.paths.config_file.exists();
    if exists && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    config.validate()?;
    config.save()?;

    let store_path = config.store_path();
    if let Some(data_dir) = store_path.parent() {
        tokio::fs::create_dir_all(data_dir).await?;
        info!("Created data directory at {:?}", data_dir);
    }

    Ok(InitInfo {
        base_dir: config.paths.base_dir.clone(),
        config_path: config.paths.config_file.clone(),
        store_path,
        overwritten: exists,
    })
}

pub fn print_init(info: &InitInfo) {
    println!("✓ Initialized lexrag at {:?}", info.base_dir);
    println!("\nConfiguration: {:?}", info.config_path);
    println!("Vector store: {:?}", info.store_path);
    println!("\nNext steps:");
    println!("  lexrag ingest ./data/raw               # Chunk, embed and snapshot a corpus");
    println!("  lexrag query \"I hit someone with car\"  # Retrieve relevant chunks");
    println!("  lexrag status                          # Check the embedding service");
}
