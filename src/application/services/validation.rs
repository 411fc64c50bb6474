//! Record validation applied before any write

use crate::domain::entities::{
    Character, LoreEntry, CHARACTER_SCHEMA_VERSION, LORE_SCHEMA_VERSION,
};
use crate::domain::value_objects::DialogueSettings;

/// Validation error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field_name} cannot be empty")]
    Empty { field_name: &'static str },

    #[error("{field_name} exceeds maximum length of {max}")]
    TooLong { field_name: &'static str, max: usize },

    #[error("{field_name} is invalid: {reason}")]
    Invalid { field_name: &'static str, reason: String },
}

/// Validate a string is non-empty after trimming.
pub fn require_non_empty(value: &str, field_name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field_name });
    }
    Ok(())
}

/// Validate a string doesn't exceed max length.
pub fn require_max_length(
    value: &str,
    max: usize,
    field_name: &'static str,
) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::TooLong { field_name, max });
    }
    Ok(())
}

/// History files are bare file names inside the history directory
pub fn require_plain_file_name(value: &str, field_name: &'static str) -> Result<(), ValidationError> {
    require_non_empty(value, field_name)?;
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(ValidationError::Invalid {
            field_name,
            reason: format!("'{}' is not a plain file name", value),
        });
    }
    Ok(())
}

pub fn validate_character(
    character: &Character,
    settings: &DialogueSettings,
) -> Result<(), ValidationError> {
    require_non_empty(&character.name, "name")?;
    require_max_length(&character.name, settings.max_name_length, "name")?;
    require_max_length(
        &character.description,
        settings.max_description_length,
        "description",
    )?;

    if character.schema_version > CHARACTER_SCHEMA_VERSION {
        return Err(ValidationError::Invalid {
            field_name: "schema_version",
            reason: format!(
                "version {} is newer than supported version {}",
                character.schema_version, CHARACTER_SCHEMA_VERSION
            ),
        });
    }

    for memory in &character.memories {
        require_non_empty(&memory.content, "memories.content")?;
    }

    let mut seen = std::collections::HashSet::new();
    for file_name in &character.associated_history_files {
        require_plain_file_name(file_name, "associated_history_files")?;
        if !seen.insert(file_name.as_str()) {
            return Err(ValidationError::Invalid {
                field_name: "associated_history_files",
                reason: format!("'{}' is listed more than once", file_name),
            });
        }
    }

    Ok(())
}

pub fn validate_lore_entry(
    entry: &LoreEntry,
    settings: &DialogueSettings,
) -> Result<(), ValidationError> {
    require_non_empty(&entry.name, "name")?;
    require_max_length(&entry.name, settings.max_name_length, "name")?;
    require_max_length(
        &entry.description,
        settings.max_description_length,
        "description",
    )?;
    if entry.schema_version > LORE_SCHEMA_VERSION {
        return Err(ValidationError::Invalid {
            field_name: "schema_version",
            reason: format!(
                "version {} is newer than supported version {}",
                entry.schema_version, LORE_SCHEMA_VERSION
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_name_required() {
        let settings = DialogueSettings::default();
        let character = Character::new("   ");
        assert_eq!(
            validate_character(&character, &settings),
            Err(ValidationError::Empty { field_name: "name" })
        );

        let character = Character::new("Gundren Rockseeker");
        assert!(validate_character(&character, &settings).is_ok());
    }

    #[test]
    fn test_history_files_must_be_plain_and_unique() {
        let settings = DialogueSettings::default();
        let mut character = Character::new("Nundro");
        character.associated_history_files = vec!["../secrets.txt".into()];
        assert!(validate_character(&character, &settings).is_err());

        character.associated_history_files = vec!["a.txt".into(), "a.txt".into()];
        assert!(validate_character(&character, &settings).is_err());
    }

    #[test]
    fn test_future_schema_rejected() {
        let settings = DialogueSettings::default();
        let mut character = Character::new("Nezznar");
        character.schema_version = CHARACTER_SCHEMA_VERSION + 1;
        assert!(validate_character(&character, &settings).is_err());
    }
}
