//! Prompt building for dialogue turns
//!
//! The generation context is a fixed sequence of sections. Section order is
//! part of the contract so that the same character and request always
//! produce the same prompt; see [`SectionKind`]. Optional sections with
//! nothing to say are left out rather than rendered empty.

use std::collections::BTreeMap;
use std::fmt;

use super::suggestion_parser::{
    standing_key, ACTION_KEY, CHECK_KEY, JUSTIFICATION_KEY, TOPICS_KEY,
};
use crate::application::dto::{DialogueTurnRequest, TurnKind};
use crate::domain::entities::{Character, CharacterType};
use crate::domain::value_objects::FactionStanding;

/// Context sections in the order they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    Identity,
    DetailedHistory,
    LinkedLore,
    CannedResponses,
    Motivations,
    RecentMemories,
    Standing,
    Scene,
    RecentConversation,
    Task,
    OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSection {
    pub kind: SectionKind,
    pub text: String,
}

/// Ordered generation context for one turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationContext {
    pub sections: Vec<ContextSection>,
}

impl GenerationContext {
    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.text.as_str())
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn push(&mut self, kind: SectionKind, text: String) {
        debug_assert!(self.sections.last().map_or(true, |last| last.kind < kind));
        self.sections.push(ContextSection { kind, text });
    }
}

impl fmt::Display for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Everything resolved ahead of assembly
#[derive(Debug, Clone, Copy)]
pub struct ContextInputs<'a> {
    pub character: &'a Character,
    pub request: &'a DialogueTurnRequest,
    pub standing: Option<FactionStanding>,
    pub speaker_name: &'a str,
    pub present_names: &'a [String],
    pub lore_summary: &'a str,
    pub history: &'a str,
    pub canned_responses: &'a BTreeMap<String, String>,
    pub recent_memory_limit: usize,
    pub recent_conversation_limit: usize,
}

/// Assemble the generation context for one turn
pub fn build_context(inputs: ContextInputs<'_>) -> GenerationContext {
    let character = inputs.character;
    let mut context = GenerationContext::default();

    context.push(SectionKind::Identity, identity_section(character));

    let history = inputs.history.trim();
    if !history.is_empty() {
        context.push(
            SectionKind::DetailedHistory,
            format!("--- Detailed History ---\n{}", history),
        );
    }

    let lore = inputs.lore_summary.trim();
    if !lore.is_empty() {
        context.push(
            SectionKind::LinkedLore,
            format!("--- Relevant World Lore ---\n{}", lore),
        );
    }

    if !inputs.canned_responses.is_empty() {
        let mut text = String::from("--- Canned Responses ---\n");
        text.push_str(
            "If the conversation touches one of these topics, use the given response verbatim:\n",
        );
        for (keyword, response) in inputs.canned_responses {
            text.push_str(&format!("- \"{}\": \"{}\"\n", keyword, response));
        }
        context.push(SectionKind::CannedResponses, text.trim_end().to_string());
    }

    if let Some(text) = motivations_section(character) {
        context.push(SectionKind::Motivations, text);
    }

    let memories = character.recent_memories(inputs.recent_memory_limit);
    if !memories.is_empty() {
        let mut text = String::from("--- Recent Memories (most recent first) ---\n");
        for memory in memories {
            text.push_str(&format!(
                "- [{}] {}\n",
                memory.timestamp.format("%Y-%m-%d"),
                memory.content
            ));
        }
        context.push(SectionKind::RecentMemories, text.trim_end().to_string());
    }

    let standing = match inputs.standing {
        Some(level) => format!(
            "--- Standing ---\nYour standing toward {} is {}. {}",
            inputs.speaker_name,
            level,
            level.tone()
        ),
        None => format!(
            "--- Standing ---\nYou have no established standing toward {}. Treat them as a stranger.",
            inputs.speaker_name
        ),
    };
    context.push(SectionKind::Standing, standing);

    let mut scene = format!("--- Scene ---\n{}", inputs.request.scene_description.trim());
    if !inputs.present_names.is_empty() {
        scene.push_str(&format!("\nPresent: {}", inputs.present_names.join(", ")));
    }
    context.push(SectionKind::Scene, scene);

    let conversation = &inputs.request.recent_conversation;
    if !conversation.is_empty() {
        let skip = conversation
            .len()
            .saturating_sub(inputs.recent_conversation_limit);
        let mut text = String::from("--- Recent Conversation ---\n");
        for line in &conversation[skip..] {
            text.push_str(line.trim());
            text.push('\n');
        }
        context.push(SectionKind::RecentConversation, text.trim_end().to_string());
    }

    context.push(
        SectionKind::Task,
        task_section(&character.name, inputs.speaker_name, inputs.request),
    );

    context.push(
        SectionKind::OutputFormat,
        output_format_section(inputs.request),
    );

    context
}

fn identity_section(character: &Character) -> String {
    let role = match character.character_type {
        CharacterType::Npc => "a non-player character",
        CharacterType::Pc => "a player character",
    };
    let mut text = format!("You are {}, {} in a tabletop roleplaying game.", character.name, role);

    if !character.description.trim().is_empty() {
        text.push_str(&format!("\nDescription: {}", character.description.trim()));
    }
    let profile: Vec<String> = [
        ("Race", &character.race),
        ("Class", &character.class_role),
        ("Alignment", &character.alignment),
        ("Age", &character.age),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
    .collect();
    if !profile.is_empty() {
        text.push_str(&format!("\n{}", profile.join(" | ")));
    }
    if !character.personality_traits.is_empty() {
        text.push_str(&format!(
            "\nPersonality: {}",
            character.personality_traits.join(", ")
        ));
    }
    if let Some(speech) = &character.speech_patterns {
        text.push_str(&format!("\nSpeech: {}", speech));
    }
    if let Some(mannerisms) = &character.mannerisms {
        text.push_str(&format!("\nMannerisms: {}", mannerisms));
    }
    if let Some(background) = &character.background_story {
        text.push_str(&format!("\nBackground: {}", background));
    }
    if let Some(past) = &character.past_situation {
        text.push_str(&format!("\nPast situation: {}", past));
    }
    if let Some(current) = &character.current_situation {
        text.push_str(&format!("\nCurrent situation: {}", current));
    }
    if !character.knowledge.is_empty() {
        text.push_str("\nYou know:");
        for fact in &character.knowledge {
            text.push_str(&format!("\n- {}", fact));
        }
    }
    text
}

fn motivations_section(character: &Character) -> Option<String> {
    let groups = [
        ("Motivations", &character.motivations),
        ("Ideals", &character.ideals),
        ("Bonds", &character.bonds),
        ("Flaws", &character.flaws),
    ];
    let lines: Vec<String> = groups
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(label, items)| format!("{}: {}", label, items.join("; ")))
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(format!("--- Motivations ---\n{}", lines.join("\n")))
}

fn task_section(name: &str, speaker: &str, request: &DialogueTurnRequest) -> String {
    let utterance = request.utterance().unwrap_or_default();
    let instruction = match request.kind() {
        TurnKind::Utterance => format!(
            "{} says: \"{}\"\nRespond in character as {}.",
            speaker, utterance, name
        ),
        TurnKind::SystemDirective => format!(
            "The game master directs: {}\nFollow the directive while staying in character as {}.",
            utterance, name
        ),
        TurnKind::Ambient => format!(
            "Nobody has addressed you directly. Describe what {} says or does in reaction to the scene.",
            name
        ),
    };
    format!("--- Your Task ---\n{}", instruction)
}

fn output_format_section(request: &DialogueTurnRequest) -> String {
    let standing = standing_key(request.speaking_counterpart_id.as_ref());
    format!(
        "--- Required Output ---\n\
         After your dialogue, provide these lines exactly. Use 'None' if not applicable.\n\
         {} [brief non-verbal actions, separated by semicolons]\n\
         {} [one skill check a player might attempt]\n\
         {} [two follow-up questions the player could ask, separated by a semicolon]\n\
         {} [one of {} or 'No change']\n\
         {} [why the standing should change or stay the same]",
        ACTION_KEY,
        CHECK_KEY,
        TOPICS_KEY,
        standing,
        FactionStanding::vocabulary(),
        JUSTIFICATION_KEY
    )
}
