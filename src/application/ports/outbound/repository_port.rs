//! Repository ports - Interfaces for record persistence
//!
//! Every mutation is a single-document upsert keyed by the record id, so
//! implementations only need per-record atomicity.

use async_trait::async_trait;

use crate::domain::entities::{Character, LoreEntry};
use crate::domain::value_objects::{CharacterId, LoreEntryId};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

// =============================================================================
// Character Repository Port
// =============================================================================

#[async_trait]
pub trait CharacterRepositoryPort: Send + Sync {
    /// Get a character by ID
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError>;

    /// Find a character by name, compared through its slug
    async fn find_by_name(&self, name: &str) -> Result<Option<Character>, RepositoryError>;

    /// List all characters ordered by name
    async fn list(&self) -> Result<Vec<Character>, RepositoryError>;

    /// Insert or replace the character with the same ID
    async fn upsert(&self, character: &Character) -> Result<(), RepositoryError>;
}

// =============================================================================
// Lore Repository Port
// =============================================================================

#[async_trait]
pub trait LoreRepositoryPort: Send + Sync {
    async fn get(&self, id: LoreEntryId) -> Result<Option<LoreEntry>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<LoreEntry>, RepositoryError>;

    async fn list(&self) -> Result<Vec<LoreEntry>, RepositoryError>;

    async fn upsert(&self, entry: &LoreEntry) -> Result<(), RepositoryError>;
}
