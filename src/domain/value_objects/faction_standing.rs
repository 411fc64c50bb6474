//! Faction standing - the closed, ordered vocabulary of relationship tone
//!
//! Standings are stored per (character, counterpart) pair. The ordering only
//! drives tone selection when assembling generation context; there is no
//! arithmetic on levels and no automatic progression. A generator may
//! *suggest* a new level, but only an explicit write applies it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relationship level of a character toward a counterpart.
///
/// Variants are declared from lowest to highest so the derived `Ord`
/// matches `Ally > Warmly > ... > Threatening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionStanding {
    Threatening,
    Dubious,
    Apprehensive,
    Indifferent,
    Amiable,
    Kindly,
    Warmly,
    Ally,
}

impl FactionStanding {
    /// All levels, highest first.
    pub const ALL: [FactionStanding; 8] = [
        Self::Ally,
        Self::Warmly,
        Self::Kindly,
        Self::Amiable,
        Self::Indifferent,
        Self::Apprehensive,
        Self::Dubious,
        Self::Threatening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ally => "Ally",
            Self::Warmly => "Warmly",
            Self::Kindly => "Kindly",
            Self::Amiable => "Amiable",
            Self::Indifferent => "Indifferent",
            Self::Apprehensive => "Apprehensive",
            Self::Dubious => "Dubious",
            Self::Threatening => "Threatening",
        }
    }

    /// How the character should sound at this level
    pub fn tone(&self) -> &'static str {
        match self {
            Self::Ally => "You trust them completely and will go out of your way to help.",
            Self::Warmly => "You are openly fond of them; speak with warmth and familiarity.",
            Self::Kindly => "You are well disposed toward them and generous with your time.",
            Self::Amiable => "You are friendly, if not yet close.",
            Self::Indifferent => "You have no strong feelings either way; be neutral and matter-of-fact.",
            Self::Apprehensive => "You are wary of them; keep answers guarded.",
            Self::Dubious => "You distrust them and doubt their intentions.",
            Self::Threatening => "You see them as a danger; be hostile or intimidating.",
        }
    }

    /// Comma separated list of every level, highest first
    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FactionStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a standing level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown faction standing: {0}")]
pub struct UnknownStanding(pub String);

impl FromStr for FactionStanding {
    type Err = UnknownStanding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownStanding(needle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(FactionStanding::Ally > FactionStanding::Warmly);
        assert!(FactionStanding::Amiable > FactionStanding::Indifferent);
        assert!(FactionStanding::Dubious > FactionStanding::Threatening);

        let mut sorted = FactionStanding::ALL.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, FactionStanding::ALL.to_vec());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("amiable".parse(), Ok(FactionStanding::Amiable));
        assert_eq!("  WARMLY ".parse(), Ok(FactionStanding::Warmly));
        assert!("Superfan".parse::<FactionStanding>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&FactionStanding::Apprehensive).unwrap();
        assert_eq!(json, "\"Apprehensive\"");
    }
}
