//! History content loader
//!
//! Resolves a character's associated history file names into text. A missing
//! or unreadable file never stops the remaining files from loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::validation::require_plain_file_name;

/// Returned as the combined text when nothing could be loaded
pub const NO_HISTORY_CONTENT: &str = "No detailed history available.";

/// Outcome of loading one history file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryText {
    Loaded(String),
    NotFound,
    Error(String),
}

impl HistoryText {
    /// Content, or the sentinel shown in its place
    pub fn as_display(&self) -> &str {
        match self {
            Self::Loaded(text) => text,
            Self::NotFound => "[file not found]",
            Self::Error(_) => "[error loading file]",
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Per-file results plus the concatenated text in list order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryContent {
    pub files: BTreeMap<String, HistoryText>,
    pub combined: String,
}

impl HistoryContent {
    pub fn is_empty(&self) -> bool {
        self.combined == NO_HISTORY_CONTENT
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLoader {
    dir: PathBuf,
}

impl HistoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a history file with this exact name exists
    pub async fn exists(&self, file_name: &str) -> bool {
        if require_plain_file_name(file_name, "history file").is_err() {
            return false;
        }
        tokio::fs::metadata(self.dir.join(file_name))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Load every file in order; duplicates in the input are read once
    pub async fn load(&self, file_names: &[String]) -> HistoryContent {
        let mut files = BTreeMap::new();
        let mut combined = String::new();

        for file_name in file_names {
            if files.contains_key(file_name) {
                continue;
            }
            let text = self.load_one(file_name).await;
            if let HistoryText::Loaded(content) = &text {
                let content = content.trim();
                if !content.is_empty() {
                    combined.push_str(&format!("--- From: {} ---\n{}\n\n", file_name, content));
                }
            }
            files.insert(file_name.clone(), text);
        }

        let combined = if combined.is_empty() {
            NO_HISTORY_CONTENT.to_string()
        } else {
            combined.trim_end().to_string()
        };

        HistoryContent { files, combined }
    }

    async fn load_one(&self, file_name: &str) -> HistoryText {
        if let Err(e) = require_plain_file_name(file_name, "history file") {
            warn!(file = %file_name, error = %e, "Refusing to load history file");
            return HistoryText::Error(e.to_string());
        }

        let path = self.dir.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(file = %file_name, bytes = content.len(), "Loaded history file");
                HistoryText::Loaded(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file = %file_name, "History file not found");
                HistoryText::NotFound
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "Error loading history file");
                HistoryText::Error(e.to_string())
            }
        }
    }
}
