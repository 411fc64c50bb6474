//! Lore categories

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of lore entry categories.
///
/// Deserialization never fails on an unknown label: anything that is not one
/// of the known categories becomes `Miscellaneous` so a single odd lore file
/// cannot block ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoreCategory {
    Location,
    OrganizationFaction,
    HistoricalEvent,
    KeyItemArtifact,
    ConceptDeity,
    #[default]
    Miscellaneous,
}

impl LoreCategory {
    pub const ALL: [LoreCategory; 6] = [
        Self::Location,
        Self::OrganizationFaction,
        Self::HistoricalEvent,
        Self::KeyItemArtifact,
        Self::ConceptDeity,
        Self::Miscellaneous,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::OrganizationFaction => "Organization/Faction",
            Self::HistoricalEvent => "Historical Event",
            Self::KeyItemArtifact => "Key Item/Artifact",
            Self::ConceptDeity => "Concept/Deity",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// Parse a label, degrading unknown values to `Miscellaneous`
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Miscellaneous)
    }
}

impl fmt::Display for LoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LoreCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LoreCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(label)) => Self::from_label(&label),
            _ => Self::Miscellaneous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_round_trip() {
        for category in LoreCategory::ALL {
            assert_eq!(LoreCategory::from_label(category.label()), category);
        }
    }

    #[test]
    fn test_unknown_label_degrades() {
        let parsed: LoreCategory = serde_json::from_str("\"Recipe\"").unwrap();
        assert_eq!(parsed, LoreCategory::Miscellaneous);

        let parsed: LoreCategory = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, LoreCategory::Miscellaneous);
    }

    #[test]
    fn test_label_match_ignores_case() {
        assert_eq!(
            LoreCategory::from_label("organization/faction"),
            LoreCategory::OrganizationFaction
        );
    }
}
