//! Character entity - NPCs and player characters with memories and standings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Memory;
use crate::domain::value_objects::{slugify, CharacterId, FactionStanding, LoreEntryId, MemoryId};

/// Current version of the stored character document
pub const CHARACTER_SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    CHARACTER_SCHEMA_VERSION
}

/// Whether the record is run by the GM or by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterType {
    #[default]
    #[serde(rename = "NPC", alias = "npc", alias = "Npc")]
    Npc,
    #[serde(rename = "PC", alias = "pc", alias = "Pc")]
    Pc,
}

/// Opaque payload lifted from a virtual-tabletop actor export
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetImport {
    #[serde(default)]
    pub system: Value,
    #[serde(default)]
    pub flags: Value,
}

/// A character (NPC or PC) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub id: CharacterId,
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    // Identity
    pub name: String,
    #[serde(default)]
    pub character_type: CharacterType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(rename = "class", alias = "class_str", default, skip_serializing_if = "Option::is_none")]
    pub class_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_patterns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mannerisms: Option<String>,

    // Narrative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_situation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_situation: Option<String>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default)]
    pub ideals: Vec<String>,
    #[serde(default)]
    pub bonds: Vec<String>,
    #[serde(default)]
    pub flaws: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Value>,
    #[serde(default)]
    pub knowledge: Vec<String>,
    /// Keyword -> verbatim response the generator should reuse
    #[serde(default)]
    pub canned_conversations: BTreeMap<String, String>,

    // Runtime-owned
    #[serde(default)]
    pub memories: Vec<Memory>,
    #[serde(default)]
    pub associated_history_files: Vec<String>,
    #[serde(default)]
    pub faction_standings: BTreeMap<CharacterId, FactionStanding>,

    // Links and imports
    #[serde(default)]
    pub linked_lore_ids: Vec<LoreEntryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_import: Option<SheetImport>,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_notes: Option<String>,

    /// Fields a source carried that the schema does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            schema_version: CHARACTER_SCHEMA_VERSION,
            name: name.into(),
            character_type: CharacterType::Npc,
            description: String::new(),
            race: None,
            class_role: None,
            alignment: None,
            age: None,
            personality_traits: Vec::new(),
            speech_patterns: None,
            mannerisms: None,
            background_story: None,
            past_situation: None,
            current_situation: None,
            motivations: Vec::new(),
            ideals: Vec::new(),
            bonds: Vec::new(),
            flaws: Vec::new(),
            relationships: Vec::new(),
            knowledge: Vec::new(),
            canned_conversations: BTreeMap::new(),
            memories: Vec::new(),
            associated_history_files: Vec::new(),
            faction_standings: BTreeMap::new(),
            linked_lore_ids: Vec::new(),
            sheet_import: None,
            items: Vec::new(),
            portrait_path: None,
            gm_notes: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_type(mut self, character_type: CharacterType) -> Self {
        self.character_type = character_type;
        self
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Stored standing toward a counterpart, `None` when nothing is established
    pub fn standing_toward(&self, counterpart: &CharacterId) -> Option<FactionStanding> {
        self.faction_standings.get(counterpart).copied()
    }

    /// Record a standing; returns the previous level if there was one
    pub fn set_standing(
        &mut self,
        counterpart: CharacterId,
        standing: FactionStanding,
    ) -> Option<FactionStanding> {
        self.faction_standings.insert(counterpart, standing)
    }

    pub fn add_memory(&mut self, memory: Memory) {
        self.memories.push(memory);
    }

    pub fn remove_memory(&mut self, memory_id: &MemoryId) -> bool {
        if let Some(pos) = self.memories.iter().position(|m| m.id == *memory_id) {
            self.memories.remove(pos);
            true
        } else {
            false
        }
    }

    /// Most recent memories first, at most `limit` of them
    pub fn recent_memories(&self, limit: usize) -> Vec<&Memory> {
        let mut memories: Vec<&Memory> = self.memories.iter().collect();
        // Stable sort keeps append order for equal timestamps
        memories.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        memories.into_iter().rev().take(limit).collect()
    }

    /// Associate a history file; returns false if it was already associated
    pub fn associate_history_file(&mut self, file_name: impl Into<String>) -> bool {
        let file_name = file_name.into();
        if self.associated_history_files.contains(&file_name) {
            return false;
        }
        self.associated_history_files.push(file_name);
        true
    }

    pub fn dissociate_history_file(&mut self, file_name: &str) -> bool {
        let before = self.associated_history_files.len();
        self.associated_history_files.retain(|f| f != file_name);
        before != self.associated_history_files.len()
    }

    pub fn link_lore(&mut self, lore_id: LoreEntryId) -> bool {
        if self.linked_lore_ids.contains(&lore_id) {
            return false;
        }
        self.linked_lore_ids.push(lore_id);
        true
    }

    pub fn unlink_lore(&mut self, lore_id: &LoreEntryId) -> bool {
        let before = self.linked_lore_ids.len();
        self.linked_lore_ids.retain(|id| id != lore_id);
        before != self.linked_lore_ids.len()
    }
}

/// Drop repeated entries while keeping first-seen order
pub fn dedup_preserving_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
