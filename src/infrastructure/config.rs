//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::services::SyncSources;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection URL for the document store
    pub database_url: String,

    /// Directory holding primary character definition files
    pub data_dir: PathBuf,
    /// Virtual-tabletop actor exports
    pub vtt_import_dir: PathBuf,
    /// Free-text history files
    pub history_dir: PathBuf,
    /// Lore definition files
    pub lore_dir: PathBuf,

    /// Ollama API base URL (OpenAI-compatible)
    pub ollama_base_url: String,
    /// Model used for dialogue turns
    pub ollama_model: String,

    /// Run the synchronizer when the process starts
    pub sync_on_startup: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let dir_or = |key: &str, default: &str| {
            env::var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join(default))
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://chronicler.db?mode=rwc".to_string()),

            vtt_import_dir: dir_or("VTT_IMPORT_DIR", "vtt_imports"),
            history_dir: dir_or("HISTORY_DIR", "history"),
            lore_dir: dir_or("LORE_DIR", "lore"),
            data_dir: data_dir.clone(),

            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),

            sync_on_startup: parse_flag(
                &env::var("SYNC_ON_STARTUP").unwrap_or_else(|_| "true".to_string()),
            )
            .context("SYNC_ON_STARTUP must be true or false")?,
        })
    }

    /// Source locations for the synchronizer
    pub fn sync_sources(&self) -> SyncSources {
        SyncSources {
            primary_dir: self.data_dir.clone(),
            sheet_import_dir: Some(self.vtt_import_dir.clone()),
            history_dir: Some(self.history_dir.clone()),
            lore_dir: Some(self.lore_dir.clone()),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{}' is not a boolean", other),
    }
}
