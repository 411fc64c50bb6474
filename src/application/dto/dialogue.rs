//! Dialogue turn DTOs

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CharacterId, FactionStanding};

/// Prefix the table UI uses for out-of-character instructions
pub const SYSTEM_DIRECTIVE_PREFIX: &str = "(System Directive:";

/// One interaction turn addressed to a character
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueTurnRequest {
    #[serde(alias = "scene_context")]
    pub scene_description: String,
    #[serde(default)]
    pub player_utterance: Option<String>,
    #[serde(default, alias = "active_pcs")]
    pub present_character_ids: Vec<CharacterId>,
    #[serde(default)]
    pub speaking_counterpart_id: Option<CharacterId>,
    #[serde(default, alias = "recent_dialogue_history")]
    pub recent_conversation: Vec<String>,
}

/// What kind of beat a turn is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// Someone spoke to the character
    Utterance,
    /// The GM injected an out-of-character instruction
    SystemDirective,
    /// Nothing was said; the character reacts to the scene
    Ambient,
}

impl DialogueTurnRequest {
    pub fn new(scene_description: impl Into<String>) -> Self {
        Self {
            scene_description: scene_description.into(),
            ..Default::default()
        }
    }

    pub fn with_utterance(mut self, utterance: impl Into<String>) -> Self {
        self.player_utterance = Some(utterance.into());
        self
    }

    pub fn with_speaker(mut self, counterpart: CharacterId) -> Self {
        self.speaking_counterpart_id = Some(counterpart);
        self
    }

    /// The utterance with surrounding whitespace removed, if any was given
    pub fn utterance(&self) -> Option<&str> {
        self.player_utterance
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn kind(&self) -> TurnKind {
        match self.utterance() {
            None => TurnKind::Ambient,
            Some(u) if u.starts_with(SYSTEM_DIRECTIVE_PREFIX) => TurnKind::SystemDirective,
            Some(_) => TurnKind::Utterance,
        }
    }
}

/// Standing change the generator proposed. Never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StandingSuggestion {
    #[default]
    NoChange,
    Change(FactionStanding),
    /// Non-empty text outside the vocabulary, kept verbatim
    Unrecognized(String),
}

/// Structured result of one dialogue turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTurnResult {
    pub dialogue: String,
    pub npc_actions: Vec<String>,
    pub player_checks: Vec<String>,
    pub generated_topics: Vec<String>,
    pub standing: StandingSuggestion,
    /// The standing text exactly as the generator wrote it
    pub standing_raw: Option<String>,
    pub justification: String,
    pub memory_suggestions: Vec<String>,
}

pub const DEFAULT_JUSTIFICATION: &str = "Not specified";

impl Default for SuggestedTurnResult {
    fn default() -> Self {
        Self {
            dialogue: String::new(),
            npc_actions: Vec::new(),
            player_checks: Vec::new(),
            generated_topics: Vec::new(),
            standing: StandingSuggestion::NoChange,
            standing_raw: None,
            justification: DEFAULT_JUSTIFICATION.to_string(),
            memory_suggestions: Vec::new(),
        }
    }
}

impl SuggestedTurnResult {
    /// Result carrying only a human readable message, every suggestion defaulted
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            dialogue: message.into(),
            ..Default::default()
        }
    }

    pub fn suggested_standing(&self) -> Option<FactionStanding> {
        match self.standing {
            StandingSuggestion::Change(level) => Some(level),
            _ => None,
        }
    }

    /// True when any suggestion field differs from its default
    pub fn has_suggestions(&self) -> bool {
        !self.npc_actions.is_empty()
            || !self.player_checks.is_empty()
            || !self.generated_topics.is_empty()
            || self.standing != StandingSuggestion::NoChange
            || self.justification != DEFAULT_JUSTIFICATION
    }
}
