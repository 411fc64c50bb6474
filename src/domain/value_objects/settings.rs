//! Dialogue and validation settings value object

use serde::{Deserialize, Serialize};

/// Tunables for dialogue turns and record validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogueSettings {
    // Generation
    pub temperature: f32,
    pub max_tokens: Option<u32>,

    // Context assembly
    pub recent_memory_limit: usize,
    pub recent_conversation_limit: usize,

    // Validation
    pub max_name_length: usize,
    pub max_description_length: usize,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: Some(800),
            recent_memory_limit: 5,
            recent_conversation_limit: 20,
            max_name_length: 255,
            max_description_length: 10000,
        }
    }
}

impl DialogueSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temperature: env_or("CHRONICLER_TEMPERATURE", defaults.temperature),
            max_tokens: std::env::var("CHRONICLER_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.max_tokens),
            recent_memory_limit: env_or("CHRONICLER_RECENT_MEMORY_LIMIT", defaults.recent_memory_limit),
            recent_conversation_limit: env_or(
                "CHRONICLER_RECENT_CONVERSATION_LIMIT",
                defaults.recent_conversation_limit,
            ),
            max_name_length: env_or("CHRONICLER_MAX_NAME_LENGTH", defaults.max_name_length),
            max_description_length: env_or(
                "CHRONICLER_MAX_DESCRIPTION_LENGTH",
                defaults.max_description_length,
            ),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
