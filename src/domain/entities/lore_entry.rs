//! Lore entry entity - named units of world knowledge

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{slugify, CharacterId, LoreCategory, LoreEntryId};

pub const LORE_SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    LORE_SCHEMA_VERSION
}

/// A piece of world lore that characters can be linked to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreEntry {
    #[serde(default, alias = "lore_id")]
    pub id: LoreEntryId,
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    pub name: String,
    #[serde(default, alias = "lore_type")]
    pub category: LoreCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_facts: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub linked_character_ids: Vec<CharacterId>,
    #[serde(default)]
    pub linked_lore_ids: Vec<LoreEntryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LoreEntry {
    pub fn new(name: impl Into<String>, category: LoreCategory) -> Self {
        let now = Utc::now();
        Self {
            id: LoreEntryId::new(),
            schema_version: LORE_SCHEMA_VERSION,
            name: name.into(),
            category,
            description: String::new(),
            key_facts: Vec::new(),
            tags: Vec::new(),
            linked_character_ids: Vec::new(),
            linked_lore_ids: Vec::new(),
            gm_notes: None,
            created_at: now,
            updated_at: now,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Structural equality ignoring bookkeeping timestamps
    pub fn same_content_as(&self, other: &LoreEntry) -> bool {
        let mut a = self.clone();
        a.created_at = other.created_at;
        a.updated_at = other.updated_at;
        a == *other
    }

    pub fn link_character(&mut self, character_id: CharacterId) -> bool {
        if self.linked_character_ids.contains(&character_id) {
            return false;
        }
        self.linked_character_ids.push(character_id);
        true
    }

    pub fn unlink_character(&mut self, character_id: &CharacterId) -> bool {
        let before = self.linked_character_ids.len();
        self.linked_character_ids.retain(|id| id != character_id);
        before != self.linked_character_ids.len()
    }

    /// One line summary plus key facts, used as generation context
    pub fn summary(&self) -> String {
        let mut summary = format!("{} ({})", self.name, self.category);
        if !self.description.is_empty() {
            summary.push_str(": ");
            summary.push_str(&self.description);
        }
        for fact in &self.key_facts {
            summary.push_str(&format!("\n  * {}", fact));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_lore_type_field() {
        let json = r#"{"name": "Cragmaw Castle", "lore_type": "Location", "description": "A ruined keep."}"#;
        let entry: LoreEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.category, LoreCategory::Location);
    }

    #[test]
    fn test_unknown_category_degrades_to_misc() {
        let json = r#"{"name": "Stew", "category": "Recipe"}"#;
        let entry: LoreEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.category, LoreCategory::Miscellaneous);
    }

    #[test]
    fn test_same_content_ignores_timestamps() {
        let a = LoreEntry::new("Phandalin", LoreCategory::Location);
        let mut b = a.clone();
        b.updated_at = b.updated_at + chrono::Duration::hours(1);
        assert!(a.same_content_as(&b));

        b.description = "A frontier town".into();
        assert!(!a.same_content_as(&b));
    }

    #[test]
    fn test_summary_lists_key_facts() {
        let mut entry = LoreEntry::new("Redbrands", LoreCategory::OrganizationFaction)
            .with_description("Ruffians in red cloaks.");
        entry.key_facts.push("Based under Tresendar Manor".into());
        let summary = entry.summary();
        assert!(summary.starts_with("Redbrands (Organization/Faction): Ruffians"));
        assert!(summary.contains("* Based under Tresendar Manor"));
    }
}
