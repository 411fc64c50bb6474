//! Character Service - Application service for character management
//!
//! Explicit, GM-driven operations on stored characters: creation, memories,
//! standings, history file associations and lore links. Each operation
//! loads one record, changes it and upserts it back.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::history_loader::{HistoryContent, HistoryLoader};
use super::validation::{require_plain_file_name, validate_character, validate_lore_entry};
use crate::application::ports::outbound::{
    CharacterRepositoryPort, LoreRepositoryPort, RepositoryError,
};
use crate::domain::entities::{Character, CharacterType, Memory, MemorySource};
use crate::domain::value_objects::{
    CharacterId, DialogueSettings, FactionStanding, LoreEntryId, MemoryId,
};

/// Memory type used when the GM adds a fact by hand
pub const GM_FACT_MEMORY_TYPE: &str = "gm_added_fact";

/// Request to create a new character
#[derive(Debug, Clone)]
pub struct CreateCharacterRequest {
    pub name: String,
    pub character_type: CharacterType,
    pub description: Option<String>,
}

/// Request to add a memory; unset fields fall back to a manual GM fact
#[derive(Debug, Clone)]
pub struct AddMemoryRequest {
    pub content: String,
    pub memory_type: Option<String>,
    pub source: Option<MemorySource>,
}

impl AddMemoryRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            memory_type: None,
            source: None,
        }
    }

    /// A memory produced by a dialogue turn
    pub fn from_dialogue(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            memory_type: None,
            source: Some(MemorySource::Dialogue),
        }
    }
}

/// Character service trait defining the application use cases
#[async_trait]
pub trait CharacterService: Send + Sync {
    async fn create_character(&self, request: CreateCharacterRequest) -> Result<Character>;

    async fn get_character(&self, id: CharacterId) -> Result<Option<Character>>;

    async fn find_character(&self, name: &str) -> Result<Option<Character>>;

    async fn list_characters(&self) -> Result<Vec<Character>>;

    async fn add_memory(&self, id: CharacterId, request: AddMemoryRequest) -> Result<Memory>;

    async fn remove_memory(&self, id: CharacterId, memory_id: MemoryId) -> Result<Character>;

    /// Apply a standing level chosen by the GM
    async fn set_standing(
        &self,
        id: CharacterId,
        counterpart: CharacterId,
        standing: FactionStanding,
    ) -> Result<Character>;

    /// `None` means no standing has been established
    async fn standing_toward(
        &self,
        id: CharacterId,
        counterpart: CharacterId,
    ) -> Result<Option<FactionStanding>>;

    async fn associate_history_file(&self, id: CharacterId, file_name: &str) -> Result<Character>;

    async fn dissociate_history_file(&self, id: CharacterId, file_name: &str)
        -> Result<Character>;

    async fn load_history(&self, id: CharacterId) -> Result<HistoryContent>;

    /// Link a character and a lore entry in both directions
    async fn link_lore(&self, id: CharacterId, lore_id: LoreEntryId) -> Result<Character>;

    async fn unlink_lore(&self, id: CharacterId, lore_id: LoreEntryId) -> Result<Character>;
}

/// Default implementation of CharacterService over the repository ports
pub struct CharacterServiceImpl {
    characters: Arc<dyn CharacterRepositoryPort>,
    lore: Arc<dyn LoreRepositoryPort>,
    history: HistoryLoader,
    settings: DialogueSettings,
}

impl CharacterServiceImpl {
    pub fn new(
        characters: Arc<dyn CharacterRepositoryPort>,
        lore: Arc<dyn LoreRepositoryPort>,
        history: HistoryLoader,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            characters,
            lore,
            history,
            settings,
        }
    }

    async fn load(&self, id: CharacterId) -> Result<Character> {
        let character = self
            .characters
            .get(id)
            .await
            .context("Failed to get character from repository")?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Character",
                id: id.to_string(),
            })?;
        Ok(character)
    }

    async fn save(&self, character: &Character) -> Result<()> {
        validate_character(character, &self.settings)?;
        self.characters
            .upsert(character)
            .await
            .context("Failed to save character in repository")
    }
}

#[async_trait]
impl CharacterService for CharacterServiceImpl {
    #[instrument(skip(self), fields(name = %request.name))]
    async fn create_character(&self, request: CreateCharacterRequest) -> Result<Character> {
        if self.characters.find_by_name(&request.name).await?.is_some() {
            anyhow::bail!("A character named '{}' already exists", request.name.trim());
        }

        let mut character =
            Character::new(request.name.trim()).with_type(request.character_type);
        if let Some(description) = request.description {
            character = character.with_description(description);
        }
        self.save(&character).await?;

        info!(character_id = %character.id, "Created character: {}", character.name);
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn get_character(&self, id: CharacterId) -> Result<Option<Character>> {
        debug!(character_id = %id, "Fetching character");
        self.characters
            .get(id)
            .await
            .context("Failed to get character from repository")
    }

    #[instrument(skip(self))]
    async fn find_character(&self, name: &str) -> Result<Option<Character>> {
        self.characters
            .find_by_name(name)
            .await
            .context("Failed to look up character by name")
    }

    #[instrument(skip(self))]
    async fn list_characters(&self) -> Result<Vec<Character>> {
        self.characters
            .list()
            .await
            .context("Failed to list characters from repository")
    }

    #[instrument(skip(self, request))]
    async fn add_memory(&self, id: CharacterId, request: AddMemoryRequest) -> Result<Memory> {
        let mut character = self.load(id).await?;
        let memory = Memory::new(
            request.content.trim(),
            request.source.unwrap_or(MemorySource::Manual),
        )
        .with_type(
            request
                .memory_type
                .unwrap_or_else(|| GM_FACT_MEMORY_TYPE.to_string()),
        );
        character.add_memory(memory.clone());
        self.save(&character).await?;

        info!(character_id = %id, memory_id = %memory.id, "Added memory");
        Ok(memory)
    }

    #[instrument(skip(self))]
    async fn remove_memory(&self, id: CharacterId, memory_id: MemoryId) -> Result<Character> {
        let mut character = self.load(id).await?;
        if !character.remove_memory(&memory_id) {
            anyhow::bail!("Memory {} not found on character {}", memory_id, id);
        }
        self.save(&character).await?;
        info!(character_id = %id, memory_id = %memory_id, "Removed memory");
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn set_standing(
        &self,
        id: CharacterId,
        counterpart: CharacterId,
        standing: FactionStanding,
    ) -> Result<Character> {
        let mut character = self.load(id).await?;
        let previous = character.set_standing(counterpart, standing);
        if previous != Some(standing) {
            self.save(&character).await?;
        }
        info!(
            character_id = %id,
            counterpart = %counterpart,
            previous = ?previous,
            standing = %standing,
            "Set faction standing"
        );
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn standing_toward(
        &self,
        id: CharacterId,
        counterpart: CharacterId,
    ) -> Result<Option<FactionStanding>> {
        Ok(self.load(id).await?.standing_toward(&counterpart))
    }

    #[instrument(skip(self))]
    async fn associate_history_file(&self, id: CharacterId, file_name: &str) -> Result<Character> {
        require_plain_file_name(file_name, "history file")?;
        let mut character = self.load(id).await?;
        if character.associate_history_file(file_name) {
            self.save(&character).await?;
            info!(character_id = %id, file = %file_name, "Associated history file");
        }
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn dissociate_history_file(
        &self,
        id: CharacterId,
        file_name: &str,
    ) -> Result<Character> {
        let mut character = self.load(id).await?;
        if character.dissociate_history_file(file_name) {
            self.save(&character).await?;
            info!(character_id = %id, file = %file_name, "Dissociated history file");
        }
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn load_history(&self, id: CharacterId) -> Result<HistoryContent> {
        let character = self.load(id).await?;
        Ok(self.history.load(&character.associated_history_files).await)
    }

    #[instrument(skip(self))]
    async fn link_lore(&self, id: CharacterId, lore_id: LoreEntryId) -> Result<Character> {
        let mut character = self.load(id).await?;
        let mut entry = self
            .lore
            .get(lore_id)
            .await
            .context("Failed to get lore entry from repository")?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Lore entry",
                id: lore_id.to_string(),
            })?;

        if character.link_lore(lore_id) {
            self.save(&character).await?;
        }
        if entry.link_character(id) {
            entry.updated_at = chrono::Utc::now();
            validate_lore_entry(&entry, &self.settings)?;
            self.lore
                .upsert(&entry)
                .await
                .context("Failed to save lore entry in repository")?;
        }
        info!(character_id = %id, lore_id = %lore_id, "Linked lore entry");
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn unlink_lore(&self, id: CharacterId, lore_id: LoreEntryId) -> Result<Character> {
        let mut character = self.load(id).await?;
        if character.unlink_lore(&lore_id) {
            self.save(&character).await?;
        }
        // The entry may already be gone; the character side is what matters
        if let Some(mut entry) = self.lore.get(lore_id).await? {
            if entry.unlink_character(&id) {
                entry.updated_at = chrono::Utc::now();
                self.lore
                    .upsert(&entry)
                    .await
                    .context("Failed to save lore entry in repository")?;
            }
        }
        info!(character_id = %id, lore_id = %lore_id, "Unlinked lore entry");
        Ok(character)
    }
}
