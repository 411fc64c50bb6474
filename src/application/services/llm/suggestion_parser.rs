//! Suggestion block parser
//!
//! The generator answers with free dialogue optionally followed by labelled
//! suggestion lines:
//!
//! ```text
//! Hello there.
//! NPC_ACTION: Nods; Waits
//! PLAYER_CHECK: Insight
//! GENERATED_TOPICS: Who runs the mine?; Where are the Redbrands?
//! STANDING_CHANGE_SUGGESTION_FOR_PLAYER: Amiable
//! JUSTIFICATION: Friendly exchange
//! ```
//!
//! Parsing runs in three phases. Every line is classified, the first line
//! carrying one of the four boundary keys splits dialogue from the block,
//! and each field is decoded from the block independently. Lines without a
//! key continue the field above them. `GENERATED_TOPICS` is read inside the
//! block but never starts one; above the block it is ordinary dialogue.
//!
//! The parser is total: every input, including the empty string, yields a
//! well-formed [`SuggestedTurnResult`].

use crate::application::dto::{StandingSuggestion, SuggestedTurnResult};
use crate::domain::value_objects::{CharacterId, FactionStanding};

pub const ACTION_KEY: &str = "NPC_ACTION:";
pub const CHECK_KEY: &str = "PLAYER_CHECK:";
pub const TOPICS_KEY: &str = "GENERATED_TOPICS:";
pub const JUSTIFICATION_KEY: &str = "JUSTIFICATION:";
pub const STANDING_KEY_PREFIX: &str = "STANDING_CHANGE_SUGGESTION_FOR_";

/// Counterpart placeholder used when the speaker is unknown
pub const UNKNOWN_COUNTERPART: &str = "PLAYER";

/// Dialogue substituted when the generator produced no spoken text
pub const NEUTRAL_DIALOGUE: &str = "(The character considers the situation...)";

/// Standing key for one counterpart, e.g. `STANDING_CHANGE_SUGGESTION_FOR_PLAYER:`
pub fn standing_key(counterpart: Option<&CharacterId>) -> String {
    match counterpart {
        Some(id) => format!("{}{}:", STANDING_KEY_PREFIX, id),
        None => format!("{}{}:", STANDING_KEY_PREFIX, UNKNOWN_COUNTERPART),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Action,
    Check,
    Topics,
    Standing,
    Justification,
}

impl Field {
    fn starts_block(self) -> bool {
        !matches!(self, Field::Topics)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Key(Field, &'a str),
    /// A standing key addressed to someone else
    ForeignStanding,
    Text(&'a str),
}

fn classify<'a>(line: &'a str, standing_key: &str) -> Line<'a> {
    let stripped = line.trim();
    let keys = [
        (ACTION_KEY, Field::Action),
        (CHECK_KEY, Field::Check),
        (TOPICS_KEY, Field::Topics),
        (standing_key, Field::Standing),
        (JUSTIFICATION_KEY, Field::Justification),
    ];
    for (key, field) in keys {
        if let Some(rest) = stripped.strip_prefix(key) {
            return Line::Key(field, rest);
        }
    }
    if stripped.starts_with(STANDING_KEY_PREFIX) {
        return Line::ForeignStanding;
    }
    Line::Text(line)
}

/// Raw field text collected from the block; first occurrence of a key wins
#[derive(Debug, Default)]
struct RawFields {
    action: Option<String>,
    check: Option<String>,
    topics: Option<String>,
    standing: Option<String>,
    justification: Option<String>,
}

impl RawFields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Action => &mut self.action,
            Field::Check => &mut self.check,
            Field::Topics => &mut self.topics,
            Field::Standing => &mut self.standing,
            Field::Justification => &mut self.justification,
        }
    }
}

/// Parse raw generator output for a turn addressed by `counterpart`
pub fn parse_suggestions(raw: &str, counterpart: Option<&CharacterId>) -> SuggestedTurnResult {
    let key = standing_key(counterpart);
    let lines: Vec<Line<'_>> = raw.lines().map(|l| classify(l, &key)).collect();

    let boundary = lines
        .iter()
        .position(|line| matches!(line, Line::Key(field, _) if field.starts_block()));

    let Some(boundary) = boundary else {
        return finish(raw.trim().to_string(), RawFields::default());
    };

    // Everything above the boundary is spoken text, keyed lines included
    let dialogue = raw
        .lines()
        .take(boundary)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let mut fields = RawFields::default();
    // Continuation lines append to the field opened above them
    let mut open: Option<Field> = None;
    for line in &lines[boundary..] {
        match line {
            Line::Key(field, rest) => {
                let slot = fields.slot(*field);
                if slot.is_some() {
                    open = None;
                    continue;
                }
                *slot = Some(rest.trim().to_string());
                open = Some(*field);
            }
            Line::ForeignStanding => open = None,
            Line::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let Some(field) = open else { continue };
                if let Some(value) = fields.slot(field).as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(text);
                }
            }
        }
    }

    finish(dialogue, fields)
}

fn finish(dialogue: String, fields: RawFields) -> SuggestedTurnResult {
    let mut result = SuggestedTurnResult {
        dialogue,
        npc_actions: decode_single(fields.action.as_deref()),
        player_checks: decode_single(fields.check.as_deref()),
        generated_topics: decode_list(fields.topics.as_deref()),
        ..Default::default()
    };

    if let Some(justification) = fields.justification.as_deref().map(clean_value) {
        if !justification.is_empty() {
            result.justification = justification.to_string();
        }
    }

    if let Some(raw) = fields.standing.as_deref() {
        let value = clean_value(raw);
        result.standing_raw = Some(value.to_string());
        result.standing = decode_standing(value);
        if let StandingSuggestion::Unrecognized(unknown) = &result.standing {
            result.justification = format!(
                "{} [Unrecognized standing suggestion: '{}']",
                result.justification, unknown
            );
        }
    }

    if result.dialogue.is_empty() {
        result.dialogue = NEUTRAL_DIALOGUE.to_string();
    }
    result
}

/// Strip whitespace and stray brackets or quotes the model wraps values in
fn clean_value(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'' | '`' | '*') || c.is_whitespace())
}

fn is_none_marker(value: &str) -> bool {
    let value = value.trim_end_matches('.');
    value.is_empty()
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("n/a")
}

fn decode_single(raw: Option<&str>) -> Vec<String> {
    match raw.map(clean_value) {
        Some(value) if !is_none_marker(value) => vec![value.to_string()],
        _ => Vec::new(),
    }
}

fn decode_list(raw: Option<&str>) -> Vec<String> {
    match raw.map(clean_value) {
        Some(value) if !is_none_marker(value) => value
            .split(';')
            .map(clean_value)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_standing(value: &str) -> StandingSuggestion {
    let value = value.trim_end_matches('.').trim();
    if is_none_marker(value) || value.eq_ignore_ascii_case("no change") {
        return StandingSuggestion::NoChange;
    }
    match value.parse::<FactionStanding>() {
        Ok(level) => StandingSuggestion::Change(level),
        Err(_) => StandingSuggestion::Unrecognized(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::DEFAULT_JUSTIFICATION;

    #[test]
    fn test_documented_example() {
        let raw = "Hello there.\nNPC_ACTION: Nods; Waits\nPLAYER_CHECK: Insight\nSTANDING_CHANGE_SUGGESTION_FOR_PLAYER: Amiable\nJUSTIFICATION: Friendly exchange";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.dialogue, "Hello there.");
        assert_eq!(result.npc_actions, vec!["Nods; Waits".to_string()]);
        assert_eq!(result.player_checks, vec!["Insight".to_string()]);
        assert_eq!(result.suggested_standing(), Some(FactionStanding::Amiable));
        assert_eq!(result.standing_raw.as_deref(), Some("Amiable"));
        assert_eq!(result.justification, "Friendly exchange");
    }

    #[test]
    fn test_plain_text_is_all_dialogue() {
        let raw = "  Well met, traveller.\nThe road to Phandalin is dangerous.  \n";
        let result = parse_suggestions(raw, None);

        assert_eq!(
            result.dialogue,
            "Well met, traveller.\nThe road to Phandalin is dangerous."
        );
        assert!(result.npc_actions.is_empty());
        assert!(result.player_checks.is_empty());
        assert_eq!(result.standing, StandingSuggestion::NoChange);
        assert_eq!(result.standing_raw, None);
        assert_eq!(result.justification, DEFAULT_JUSTIFICATION);
    }

    #[test]
    fn test_unknown_standing_is_kept_and_annotated() {
        let raw = "Oh my!\nSTANDING_CHANGE_SUGGESTION_FOR_PLAYER: Superfan\nJUSTIFICATION: They signed my tankard";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.suggested_standing(), None);
        assert_eq!(
            result.standing,
            StandingSuggestion::Unrecognized("Superfan".to_string())
        );
        assert!(result.justification.starts_with("They signed my tankard"));
        assert!(result.justification.contains("Superfan"));
    }

    #[test]
    fn test_empty_input() {
        let result = parse_suggestions("", None);
        assert_eq!(result.dialogue, NEUTRAL_DIALOGUE);
        assert!(!result.has_suggestions());
    }

    #[test]
    fn test_block_only_gets_placeholder_dialogue() {
        let raw = "PLAYER_CHECK: Persuasion\nJUSTIFICATION: Hesitant";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.dialogue, NEUTRAL_DIALOGUE);
        assert_eq!(result.player_checks, vec!["Persuasion".to_string()]);
        assert_eq!(result.justification, "Hesitant");
    }

    #[test]
    fn test_keys_in_any_order() {
        let raw = "Fine.\nJUSTIFICATION: Nothing changed\nSTANDING_CHANGE_SUGGESTION_FOR_PLAYER: No change\nPLAYER_CHECK: None\nNPC_ACTION: [Shrugs]";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.dialogue, "Fine.");
        assert_eq!(result.npc_actions, vec!["Shrugs".to_string()]);
        assert!(result.player_checks.is_empty());
        assert_eq!(result.standing, StandingSuggestion::NoChange);
        assert_eq!(result.standing_raw.as_deref(), Some("No change"));
        assert_eq!(result.justification, "Nothing changed");
    }

    #[test]
    fn test_other_counterpart_key_does_not_match() {
        let speaker = CharacterId::new();
        let other = CharacterId::new();
        let raw = format!(
            "Hmm.\nNPC_ACTION: Frowns\nSTANDING_CHANGE_SUGGESTION_FOR_{}: Ally\nJUSTIFICATION: Addressed someone else",
            other
        );
        let result = parse_suggestions(&raw, Some(&speaker));

        assert_eq!(result.standing, StandingSuggestion::NoChange);
        assert_eq!(result.standing_raw, None);
        assert_eq!(result.npc_actions, vec!["Frowns".to_string()]);

        let raw = format!("Hmm.\nSTANDING_CHANGE_SUGGESTION_FOR_{}: Dubious", speaker);
        let result = parse_suggestions(&raw, Some(&speaker));
        assert_eq!(result.suggested_standing(), Some(FactionStanding::Dubious));
    }

    #[test]
    fn test_keyed_lines_above_the_block_stay_in_dialogue() {
        let speaker = CharacterId::new();
        let other = CharacterId::new();
        let raw = format!(
            "Hmm.\nSTANDING_CHANGE_SUGGESTION_FOR_{}: Ally\nWell then.\nNPC_ACTION: Frowns",
            other
        );
        let result = parse_suggestions(&raw, Some(&speaker));

        assert_eq!(
            result.dialogue,
            format!("Hmm.\nSTANDING_CHANGE_SUGGESTION_FOR_{}: Ally\nWell then.", other)
        );
        assert_eq!(result.standing, StandingSuggestion::NoChange);
        assert_eq!(result.npc_actions, vec!["Frowns".to_string()]);

        let result = parse_suggestions("GENERATED_TOPICS: a; b\nAye.\nNPC_ACTION: x", None);
        assert_eq!(result.dialogue, "GENERATED_TOPICS: a; b\nAye.");
        assert!(result.generated_topics.is_empty());
    }

    #[test]
    fn test_placeholder_key_ignored_when_speaker_known() {
        let speaker = CharacterId::new();
        let raw = "Hmm.\nSTANDING_CHANGE_SUGGESTION_FOR_PLAYER: Ally";
        let result = parse_suggestions(raw, Some(&speaker));

        assert_eq!(result.suggested_standing(), None);
        assert_eq!(result.dialogue, "Hmm.\nSTANDING_CHANGE_SUGGESTION_FOR_PLAYER: Ally");
    }

    #[test]
    fn test_topics_are_split_but_do_not_start_the_block() {
        let raw = "GENERATED_TOPICS: Who is Glasstaff?; What is in the cave?\nAye, I know the place.\nNPC_ACTION: Leans closer\nGENERATED_TOPICS: Who leads the Redbrands?";
        let result = parse_suggestions(raw, None);

        assert_eq!(
            result.dialogue,
            "GENERATED_TOPICS: Who is Glasstaff?; What is in the cave?\nAye, I know the place."
        );
        assert_eq!(result.generated_topics, vec!["Who leads the Redbrands?".to_string()]);

        let raw = "Aye.\nNPC_ACTION: Leans closer\nGENERATED_TOPICS: Who is Glasstaff?; What is in the cave?";
        let result = parse_suggestions(raw, None);
        assert_eq!(
            result.generated_topics,
            vec!["Who is Glasstaff?".to_string(), "What is in the cave?".to_string()]
        );
    }

    #[test]
    fn test_continuation_lines_extend_the_open_field() {
        let raw = "Be gone.\nJUSTIFICATION: The player insulted\nthe innkeeper's cooking.\nPLAYER_CHECK: Intimidation";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.justification, "The player insulted the innkeeper's cooking.");
        assert_eq!(result.player_checks, vec!["Intimidation".to_string()]);
    }

    #[test]
    fn test_indented_keys_and_crlf() {
        let raw = "Greetings.\r\n   NPC_ACTION:   \"Bows\"  \r\n  STANDING_CHANGE_SUGGESTION_FOR_PLAYER: warmly.\r\n";
        let result = parse_suggestions(raw, None);

        assert_eq!(result.dialogue, "Greetings.");
        assert_eq!(result.npc_actions, vec!["Bows".to_string()]);
        assert_eq!(result.suggested_standing(), Some(FactionStanding::Warmly));
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for raw in [
            "\n\n\n",
            "NPC_ACTION:",
            "JUSTIFICATION:\n\n",
            "STANDING_CHANGE_SUGGESTION_FOR_",
            "STANDING_CHANGE_SUGGESTION_FOR_PLAYER:",
            "ünïcödé ☃\nNPC_ACTION: ☃",
        ] {
            let result = parse_suggestions(raw, None);
            assert!(!result.dialogue.is_empty());
        }
    }
}
