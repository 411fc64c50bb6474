//! Memory entity - append-only facts a character remembers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::MemoryId;

/// Where a memory came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// Produced from a dialogue turn
    #[default]
    Dialogue,
    /// Added by hand by the GM
    #[serde(alias = "gm_tool")]
    Manual,
    /// Carried in from a definition file
    Import,
    #[serde(other)]
    Other,
}

/// A single immutable fact in a character's memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(default, alias = "memory_id")]
    pub id: MemoryId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub content: String,
    /// Coarse type tag ("generic", "gm_added_fact", ...)
    #[serde(rename = "type", default = "default_memory_type")]
    pub memory_type: String,
    #[serde(default)]
    pub source: MemorySource,
}

fn default_memory_type() -> String {
    "generic".to_string()
}

impl Memory {
    pub fn new(content: impl Into<String>, source: MemorySource) -> Self {
        Self {
            id: MemoryId::new(),
            timestamp: Utc::now(),
            content: content.into(),
            memory_type: default_memory_type(),
            source,
        }
    }

    pub fn with_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = memory_type.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
