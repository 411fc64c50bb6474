//! Dialogue Service - one interaction turn from request to suggestions
//!
//! A turn resolves everything the prompt needs (speaker, standing, linked
//! lore, history text), assembles the generation context, calls the
//! generator and parses its answer. Nothing in a turn is fatal: lookups
//! that fail degrade to sentinels and a generator failure comes back as a
//! placeholder result with every suggestion defaulted.
//!
//! Suggested standings are returned, never applied.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::history_loader::HistoryLoader;
use super::llm::{build_context, parse_suggestions, ContextInputs, NEUTRAL_DIALOGUE};
use crate::application::dto::{DialogueTurnRequest, SuggestedTurnResult, TurnKind};
use crate::application::ports::outbound::{
    CharacterRepositoryPort, ChatMessage, LlmPort, LlmRequest, LoreRepositoryPort,
};
use crate::domain::entities::Character;
use crate::domain::value_objects::DialogueSettings;

/// Display name used when the speaker is unknown
pub const DEFAULT_SPEAKER_NAME: &str = "the player";

/// Summary stored when the generator cannot summarise an interaction
pub const FALLBACK_MEMORY_SUMMARY: &str = "Interaction occurred.";

pub struct DialogueService<L: LlmPort> {
    llm: L,
    characters: Arc<dyn CharacterRepositoryPort>,
    lore: Arc<dyn LoreRepositoryPort>,
    history: HistoryLoader,
    settings: DialogueSettings,
}

impl<L: LlmPort> DialogueService<L> {
    pub fn new(
        llm: L,
        characters: Arc<dyn CharacterRepositoryPort>,
        lore: Arc<dyn LoreRepositoryPort>,
        history: HistoryLoader,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            llm,
            characters,
            lore,
            history,
            settings,
        }
    }

    /// Run one turn for `character`. Always returns a well-formed result.
    #[instrument(skip(self, character, request), fields(character = %character.name, kind = ?request.kind()))]
    pub async fn run_turn(
        &self,
        character: &Character,
        request: &DialogueTurnRequest,
    ) -> SuggestedTurnResult {
        let speaker_name = self.speaker_name(request).await;
        let standing = request
            .speaking_counterpart_id
            .as_ref()
            .and_then(|id| character.standing_toward(id));
        let present_names = self.present_names(request).await;
        let lore_summary = self.lore_summary(character).await;
        let history = self.history.load(&character.associated_history_files).await;

        let context = build_context(ContextInputs {
            character,
            request,
            standing,
            speaker_name: &speaker_name,
            present_names: &present_names,
            lore_summary: &lore_summary,
            history: &history.combined,
            canned_responses: &character.canned_conversations,
            recent_memory_limit: self.settings.recent_memory_limit,
            recent_conversation_limit: self.settings.recent_conversation_limit,
        });
        debug!(sections = context.sections.len(), "Assembled generation context");

        let llm_request = LlmRequest::new(vec![ChatMessage::user(format!(
            "Respond now as {}.",
            character.name
        ))])
        .with_system_prompt(context.render())
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);

        let response = match self.llm.generate(llm_request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Generator call failed");
                return SuggestedTurnResult::degraded(format!(
                    "({} is lost in thought. The dialogue generator is unavailable.)",
                    character.name
                ));
            }
        };

        let mut result =
            parse_suggestions(&response.content, request.speaking_counterpart_id.as_ref());
        result.memory_suggestions = memory_suggestions(request, &result);

        info!(
            standing = ?result.standing,
            actions = result.npc_actions.len(),
            checks = result.player_checks.len(),
            "Dialogue turn parsed"
        );
        result
    }

    /// One-sentence summary of an interaction, suitable for a memory
    #[instrument(skip(self, player_input, npc_response))]
    pub async fn summarize_for_memory(&self, player_input: &str, npc_response: &str) -> String {
        let prompt = format!(
            "Summarize the following interaction into a single concise sentence to be stored \
             as a memory for the character. Focus on factual events or new information revealed.\n\
             Player: {}\nCharacter: {}\nSummary:",
            player_input, npc_response
        );
        let request = LlmRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(0.3)
            .with_max_tokens(Some(120));

        match self.llm.generate(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                response.content.trim().to_string()
            }
            Ok(_) => FALLBACK_MEMORY_SUMMARY.to_string(),
            Err(e) => {
                warn!(error = %e, "Memory summary failed");
                FALLBACK_MEMORY_SUMMARY.to_string()
            }
        }
    }

    async fn speaker_name(&self, request: &DialogueTurnRequest) -> String {
        let Some(id) = request.speaking_counterpart_id else {
            return DEFAULT_SPEAKER_NAME.to_string();
        };
        match self.characters.get(id).await {
            Ok(Some(speaker)) => speaker.name,
            Ok(None) => {
                debug!(speaker_id = %id, "Speaking counterpart not found");
                DEFAULT_SPEAKER_NAME.to_string()
            }
            Err(e) => {
                warn!(speaker_id = %id, error = %e, "Failed to resolve speaking counterpart");
                DEFAULT_SPEAKER_NAME.to_string()
            }
        }
    }

    async fn present_names(&self, request: &DialogueTurnRequest) -> Vec<String> {
        let mut names = Vec::with_capacity(request.present_character_ids.len());
        for id in &request.present_character_ids {
            match self.characters.get(*id).await {
                Ok(Some(present)) => names.push(present.name),
                Ok(None) => debug!(character_id = %id, "Present character not found"),
                Err(e) => warn!(character_id = %id, error = %e, "Failed to resolve present character"),
            }
        }
        names
    }

    async fn lore_summary(&self, character: &Character) -> String {
        let mut parts = Vec::with_capacity(character.linked_lore_ids.len());
        for id in &character.linked_lore_ids {
            match self.lore.get(*id).await {
                Ok(Some(entry)) => parts.push(entry.summary()),
                Ok(None) => parts.push(format!("[missing lore entry {}]", id)),
                Err(e) => {
                    warn!(lore_id = %id, error = %e, "Failed to load linked lore");
                    parts.push(format!("[error loading lore entry {}]", id));
                }
            }
        }
        parts.join("\n")
    }
}

/// Facts the caller may want to keep as memories
fn memory_suggestions(request: &DialogueTurnRequest, result: &SuggestedTurnResult) -> Vec<String> {
    let mut suggestions = Vec::new();
    if request.kind() == TurnKind::Utterance {
        if let Some(utterance) = request.utterance() {
            suggestions.push(format!("Player said: '{}'", utterance));
        }
    }
    if result.dialogue != NEUTRAL_DIALOGUE {
        suggestions.push(format!("NPC responded: '{}'", result.dialogue));
    }
    suggestions
}
