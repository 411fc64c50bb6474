//! In-memory doubles for ports, shared by service tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::outbound::{
    CharacterRepositoryPort, LlmError, LlmPort, LlmRequest, LlmResponse, LoreRepositoryPort,
    RepositoryError,
};
use crate::domain::entities::{Character, LoreEntry};
use crate::domain::value_objects::{slugify, CharacterId, LoreEntryId};

/// Character store that counts writes
#[derive(Default)]
pub struct InMemoryCharacterRepository {
    records: Mutex<HashMap<CharacterId, Character>>,
    writes: AtomicUsize,
}

impl InMemoryCharacterRepository {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterRepositoryPort for InMemoryCharacterRepository {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Character>, RepositoryError> {
        let slug = slugify(name);
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|c| c.slug() == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Character>, RepositoryError> {
        let mut all: Vec<Character> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn upsert(&self, character: &Character) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(character.id, character.clone());
        Ok(())
    }
}

/// Lore store that counts writes
#[derive(Default)]
pub struct InMemoryLoreRepository {
    records: Mutex<HashMap<LoreEntryId, LoreEntry>>,
    writes: AtomicUsize,
}

impl InMemoryLoreRepository {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoreRepositoryPort for InMemoryLoreRepository {
    async fn get(&self, id: LoreEntryId) -> Result<Option<LoreEntry>, RepositoryError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<LoreEntry>, RepositoryError> {
        let slug = slugify(name);
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|e| e.slug() == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<LoreEntry>, RepositoryError> {
        let mut all: Vec<LoreEntry> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn upsert(&self, entry: &LoreEntry) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().insert(entry.id, entry.clone());
        Ok(())
    }
}

/// Generator that replays a canned reply and remembers the last request
pub struct MockLlm {
    reply: Result<String, String>,
    pub last_request: Mutex<Option<LlmRequest>>,
}

impl MockLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> String {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|r| r.system_prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmPort for MockLlm {
    type Error = LlmError;

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, Self::Error> {
        *self.last_request.lock().unwrap() = Some(request);
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(message) => Err(LlmError::RequestFailed(message.clone())),
        }
    }
}
