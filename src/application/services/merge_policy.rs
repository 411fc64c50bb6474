//! Field precedence for merging character sources
//!
//! Each stored field has exactly one owner. The table below is the single
//! place that decides which source may write a field:
//!
//! | owner          | written by                                        |
//! |----------------|---------------------------------------------------|
//! | `Authored`     | primary definition files                          |
//! | `Imported`     | sheet imports, unless the primary defines it too  |
//! | `RuntimeOwned` | runtime operations; a primary file may add entries |
//!
//! Whatever owner a field has, a source that is silent about it leaves the
//! stored value alone. Runtime-owned fields are merged entry by entry: a
//! source may add or override entries but never removes stored ones.
//! Unknown fields are treated as authored.

use serde_json::{Map, Value};

use crate::domain::entities::{
    dedup_preserving_order, Character, CHARACTER_SCHEMA_VERSION,
};
use crate::domain::value_objects::CharacterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOwner {
    Authored,
    Imported,
    RuntimeOwned,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub owner: FieldOwner,
}

const fn rule(field: &'static str, owner: FieldOwner) -> FieldRule {
    FieldRule { field, owner }
}

pub const CHARACTER_FIELD_RULES: &[FieldRule] = &[
    rule("name", FieldOwner::Authored),
    rule("character_type", FieldOwner::Authored),
    rule("description", FieldOwner::Authored),
    rule("race", FieldOwner::Authored),
    rule("class", FieldOwner::Authored),
    rule("alignment", FieldOwner::Authored),
    rule("age", FieldOwner::Authored),
    rule("personality_traits", FieldOwner::Authored),
    rule("speech_patterns", FieldOwner::Authored),
    rule("mannerisms", FieldOwner::Authored),
    rule("background_story", FieldOwner::Authored),
    rule("past_situation", FieldOwner::Authored),
    rule("current_situation", FieldOwner::Authored),
    rule("motivations", FieldOwner::Authored),
    rule("ideals", FieldOwner::Authored),
    rule("bonds", FieldOwner::Authored),
    rule("flaws", FieldOwner::Authored),
    rule("relationships", FieldOwner::Authored),
    rule("knowledge", FieldOwner::Authored),
    rule("canned_conversations", FieldOwner::Authored),
    rule("linked_lore_ids", FieldOwner::Authored),
    rule("gm_notes", FieldOwner::Authored),
    rule("sheet_import", FieldOwner::Imported),
    rule("items", FieldOwner::Imported),
    rule("portrait_path", FieldOwner::Imported),
    rule("memories", FieldOwner::RuntimeOwned),
    rule("faction_standings", FieldOwner::RuntimeOwned),
    rule("associated_history_files", FieldOwner::RuntimeOwned),
];

/// Keys the store manages itself; sources never write them directly
const MANAGED_KEYS: &[&str] = &["id", "_id", "schema_version"];

/// Legacy spellings accepted in source files
const KEY_ALIASES: &[(&str, &str)] = &[("class_str", "class")];

/// Stored spelling of a source key
pub fn canonical_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

pub fn owner_of(field: &str) -> FieldOwner {
    CHARACTER_FIELD_RULES
        .iter()
        .find(|r| r.field == field)
        .map(|r| r.owner)
        .unwrap_or(FieldOwner::Authored)
}

/// Fields a sheet import is allowed to fill, as a JSON object.
///
/// Accepts a virtual-tabletop actor export with top-level `system`, `flags`,
/// `img` and `items` sections.
pub fn sheet_import_fields(export: &Map<String, Value>) -> Map<String, Value> {
    let mut fields = Map::new();

    let system = export.get("system").cloned();
    let flags = export.get("flags").cloned();
    if system.is_some() || flags.is_some() {
        let mut payload = Map::new();
        payload.insert("system".into(), system.unwrap_or(Value::Null));
        payload.insert("flags".into(), flags.unwrap_or(Value::Null));
        fields.insert("sheet_import".into(), Value::Object(payload));
    }
    if let Some(items) = export.get("items").filter(|v| v.is_array()) {
        fields.insert("items".into(), items.clone());
    }
    if let Some(img) = export.get("img").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        fields.insert("portrait_path".into(), Value::String(img.to_string()));
    }

    debug_assert!(fields
        .keys()
        .all(|k| owner_of(k) == FieldOwner::Imported));
    fields
}

/// Inputs to one character merge
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    pub primary: &'a Map<String, Value>,
    pub import: Option<&'a Map<String, Value>>,
    pub existing: Option<&'a Character>,
    /// History file to associate in addition to the stored and authored ones
    pub canonical_history_file: Option<&'a str>,
}

/// Merge all sources into one candidate record following the field rules.
///
/// Fails only when the merged document does not fit the character schema.
pub fn merge_character(inputs: MergeInputs<'_>) -> Result<Character, serde_json::Error> {
    let mut document = match inputs.existing {
        Some(existing) => match serde_json::to_value(existing)? {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        None => Map::new(),
    };

    if let Some(import) = inputs.import {
        for (key, value) in import {
            if owner_of(key) == FieldOwner::Imported
                && !inputs.primary.keys().any(|k| canonical_key(k) == key)
            {
                document.insert(key.clone(), value.clone());
            }
        }
    }

    for (key, value) in inputs.primary {
        if MANAGED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let key = canonical_key(key);
        let value = match owner_of(key) {
            FieldOwner::RuntimeOwned => merge_runtime_field(key, document.get(key), value),
            _ => value.clone(),
        };
        document.insert(key.to_string(), value);
    }

    let id = primary_id(inputs.primary)
        .or_else(|| inputs.existing.map(|c| c.id))
        .unwrap_or_default();
    document.insert("id".into(), Value::String(id.to_string()));
    document.insert("schema_version".into(), Value::from(CHARACTER_SCHEMA_VERSION));

    let mut character: Character = serde_json::from_value(Value::Object(document))?;

    let mut history_files = std::mem::take(&mut character.associated_history_files);
    if let Some(canonical) = inputs.canonical_history_file {
        history_files.push(canonical.to_string());
    }
    character.associated_history_files = dedup_preserving_order(history_files);

    Ok(character)
}

fn primary_id(primary: &Map<String, Value>) -> Option<CharacterId> {
    ["id", "_id"]
        .iter()
        .filter_map(|k| primary.get(*k).and_then(Value::as_str))
        .find_map(|s| s.parse().ok())
}

/// Merge one runtime-owned field from a source into its stored value
fn merge_runtime_field(key: &str, stored: Option<&Value>, source: &Value) -> Value {
    match (key, stored, source) {
        ("memories", Some(Value::Array(stored)), Value::Array(source)) => {
            Value::Array(merge_memories(stored, source))
        }
        ("faction_standings", Some(Value::Object(stored)), Value::Object(source)) => {
            let mut merged = stored.clone();
            for (counterpart, level) in source {
                merged.insert(counterpart.clone(), level.clone());
            }
            Value::Object(merged)
        }
        // Duplicates are dropped once the record is typed
        ("associated_history_files", Some(Value::Array(stored)), Value::Array(source)) => {
            Value::Array(stored.iter().chain(source).cloned().collect())
        }
        _ => source.clone(),
    }
}

/// Stored memories in stored order, each replaced by its source counterpart
/// when there is one, followed by the source memories not stored yet.
///
/// A source memory matches a stored one by id, or by content when it has no
/// id; a match inherits the stored id and timestamp it does not spell out,
/// so re-reading an unchanged file yields the same record.
fn merge_memories(stored: &[Value], source: &[Value]) -> Vec<Value> {
    let mut merged = stored.to_vec();
    for item in source {
        match stored.iter().position(|known| same_memory(known, item)) {
            Some(index) => merged[index] = inherit_identity(item, &stored[index]),
            None => merged.push(item.clone()),
        }
    }
    merged
}

fn memory_id(memory: &Value) -> Option<&str> {
    memory
        .get("id")
        .or_else(|| memory.get("memory_id"))
        .and_then(Value::as_str)
}

fn same_memory(stored: &Value, source: &Value) -> bool {
    match memory_id(source) {
        Some(id) => memory_id(stored) == Some(id),
        None => {
            let content = source.get("content").and_then(Value::as_str);
            content.is_some() && stored.get("content").and_then(Value::as_str) == content
        }
    }
}

fn inherit_identity(source: &Value, stored: &Value) -> Value {
    let (Value::Object(memory), Value::Object(known)) = (source, stored) else {
        return source.clone();
    };
    let mut memory = memory.clone();
    if memory_id(source).is_none() {
        if let Some(id) = known.get("id") {
            memory.insert("id".into(), id.clone());
        }
    }
    if !memory.contains_key("timestamp") {
        if let Some(timestamp) = known.get("timestamp") {
            memory.insert("timestamp".into(), timestamp.clone());
        }
    }
    Value::Object(memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Memory, MemorySource};
    use crate::domain::value_objects::FactionStanding;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_every_rule_names_a_schema_field() {
        let mut probe = Character::new("probe");
        for field in [
            &mut probe.race,
            &mut probe.class_role,
            &mut probe.alignment,
            &mut probe.age,
            &mut probe.speech_patterns,
            &mut probe.mannerisms,
            &mut probe.background_story,
            &mut probe.past_situation,
            &mut probe.current_situation,
            &mut probe.gm_notes,
            &mut probe.portrait_path,
        ] {
            *field = Some("x".into());
        }
        probe.sheet_import = Some(Default::default());

        let document = object(serde_json::to_value(&probe).unwrap());
        for rule in CHARACTER_FIELD_RULES {
            assert!(document.contains_key(rule.field), "unknown field {}", rule.field);
        }
    }

    #[test]
    fn test_primary_wins_over_import() {
        let primary = object(json!({
            "name": "Halia Thornton",
            "portrait_path": "portraits/halia.png"
        }));
        let export = object(json!({
            "name": "Halia",
            "img": "tokens/halia-token.webp",
            "system": {"abilities": {"cha": {"value": 16}}},
            "items": [{"name": "Dagger"}]
        }));
        let import = sheet_import_fields(&export);

        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: Some(&import),
            existing: None,
            canonical_history_file: None,
        })
        .unwrap();

        assert_eq!(merged.name, "Halia Thornton");
        assert_eq!(merged.portrait_path.as_deref(), Some("portraits/halia.png"));
        assert_eq!(merged.items.len(), 1);
        let sheet = merged.sheet_import.expect("sheet import");
        assert_eq!(sheet.system["abilities"]["cha"]["value"], json!(16));
    }

    #[test]
    fn test_silent_source_preserves_runtime_fields() {
        let pc = CharacterId::new();
        let mut existing = Character::new("Toblen Stonehill");
        existing.add_memory(Memory::new("Owes the party a favour", MemorySource::Dialogue));
        existing.set_standing(pc, FactionStanding::Kindly);
        existing.associate_history_file("toblen_extra.txt");

        let primary = object(json!({"name": "Toblen Stonehill", "description": "Innkeeper"}));
        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&existing),
            canonical_history_file: Some("Toblen Stonehill.txt"),
        })
        .unwrap();

        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.memories, existing.memories);
        assert_eq!(merged.standing_toward(&pc), Some(FactionStanding::Kindly));
        assert_eq!(
            merged.associated_history_files,
            vec!["toblen_extra.txt".to_string(), "Toblen Stonehill.txt".to_string()]
        );
        assert_eq!(merged.description, "Innkeeper");
    }

    #[test]
    fn test_explicit_source_overrides_runtime_fields() {
        let pc = CharacterId::new();
        let mut existing = Character::new("Sister Garaele");
        existing.set_standing(pc, FactionStanding::Dubious);

        let primary = object(json!({
            "name": "Sister Garaele",
            "faction_standings": { (pc.to_string()): "Ally" }
        }));
        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&existing),
            canonical_history_file: None,
        })
        .unwrap();

        assert_eq!(merged.standing_toward(&pc), Some(FactionStanding::Ally));
    }

    #[test]
    fn test_explicit_runtime_fields_never_drop_stored_entries() {
        let authored_pc = CharacterId::new();
        let runtime_pc = CharacterId::new();
        let primary = object(json!({
            "name": "Sildar Hallwinter",
            "memories": [{"content": "Member of the Lords' Alliance"}],
            "faction_standings": { (authored_pc.to_string()): "Ally" },
            "associated_history_files": ["sildar.txt"]
        }));
        let mut existing = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: None,
            canonical_history_file: None,
        })
        .unwrap();
        existing.add_memory(Memory::new("Rescued from the goblin hideout", MemorySource::Manual));
        existing.set_standing(authored_pc, FactionStanding::Warmly);
        existing.set_standing(runtime_pc, FactionStanding::Dubious);
        existing.associate_history_file("cragmaw.txt");

        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&existing),
            canonical_history_file: None,
        })
        .unwrap();

        let contents: Vec<&str> = merged.memories.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Member of the Lords' Alliance", "Rescued from the goblin hideout"]
        );
        assert_eq!(merged.memories[0].id, existing.memories[0].id);
        assert_eq!(merged.standing_toward(&authored_pc), Some(FactionStanding::Ally));
        assert_eq!(merged.standing_toward(&runtime_pc), Some(FactionStanding::Dubious));
        assert_eq!(
            merged.associated_history_files,
            vec!["sildar.txt".to_string(), "cragmaw.txt".to_string()]
        );
    }

    #[test]
    fn test_source_memory_matched_by_id_is_updated_in_place() {
        let mut existing = Character::new("Qelline Alderleaf");
        existing.add_memory(Memory::new("Farmer", MemorySource::Import));
        existing.add_memory(Memory::new("Knows Reidoth", MemorySource::Dialogue));
        let id = existing.memories[0].id;

        let primary = object(json!({
            "name": "Qelline Alderleaf",
            "memories": [{"id": id.to_string(), "content": "Halfling farmer"}]
        }));
        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&existing),
            canonical_history_file: None,
        })
        .unwrap();

        assert_eq!(merged.memories.len(), 2);
        assert_eq!(merged.memories[0].id, id);
        assert_eq!(merged.memories[0].content, "Halfling farmer");
        assert_eq!(merged.memories[0].timestamp, existing.memories[0].timestamp);
        assert_eq!(merged.memories[1], existing.memories[1]);
    }

    #[test]
    fn test_source_memories_keep_identity_across_merges() {
        let primary = object(json!({
            "name": "Daran Edermath",
            "memories": [{"content": "Retired adventurer"}]
        }));
        let first = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: None,
            canonical_history_file: None,
        })
        .unwrap();
        let second = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&first),
            canonical_history_file: None,
        })
        .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_schema_mismatch_is_an_error() {
        let primary = object(json!({"name": "Reidoth", "motivations": "protect the forest"}));
        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: None,
            canonical_history_file: None,
        });
        assert!(merged.is_err());
    }

    #[test]
    fn test_legacy_key_replaces_stored_field() {
        let mut existing = Character::new("Harbin Wester");
        existing.class_role = Some("Commoner".into());

        let primary = object(json!({"name": "Harbin Wester", "class_str": "Townmaster"}));
        let merged = merge_character(MergeInputs {
            primary: &primary,
            import: None,
            existing: Some(&existing),
            canonical_history_file: None,
        })
        .unwrap();
        assert_eq!(merged.class_role.as_deref(), Some("Townmaster"));
    }

    #[test]
    fn test_owner_lookup() {
        assert_eq!(owner_of("memories"), FieldOwner::RuntimeOwned);
        assert_eq!(owner_of("items"), FieldOwner::Imported);
        assert_eq!(owner_of("favorite_song"), FieldOwner::Authored);
    }
}
