//! Character repository implementation for SQLite
//!
//! Characters are stored whole as JSON documents; `name` and `slug` are
//! copied into columns for lookup.

use async_trait::async_trait;
use tracing::debug;

use super::connection::SqliteConnection;
use crate::application::ports::outbound::{CharacterRepositoryPort, RepositoryError};
use crate::domain::entities::Character;
use crate::domain::value_objects::{slugify, CharacterId};

/// Repository for Character operations
pub struct SqliteCharacterRepository {
    connection: SqliteConnection,
}

impl SqliteCharacterRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn decode(document: &str) -> Result<Character, RepositoryError> {
    serde_json::from_str(document).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn database(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

#[async_trait]
impl CharacterRepositoryPort for SqliteCharacterRepository {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(self.connection.pool())
            .await
            .map_err(database)?;

        row.map(|(document,)| decode(&document)).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Character>, RepositoryError> {
        let slug = slugify(name);
        debug!(slug = %slug, "Looking up character by slug");
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT document FROM characters WHERE slug = ? ORDER BY name LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(self.connection.pool())
        .await
        .map_err(database)?;

        row.map(|(document,)| decode(&document)).transpose()
    }

    async fn list(&self) -> Result<Vec<Character>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT document FROM characters ORDER BY name")
            .fetch_all(self.connection.pool())
            .await
            .map_err(database)?;

        rows.iter().map(|(document,)| decode(document)).collect()
    }

    async fn upsert(&self, character: &Character) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(character)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO characters (id, name, slug, document, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                document = excluded.document,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(character.id.to_string())
        .bind(&character.name)
        .bind(character.slug())
        .bind(document)
        .execute(self.connection.pool())
        .await
        .map_err(database)?;

        debug!(character_id = %character.id, "Upserted character");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Memory, MemorySource};
    use crate::domain::value_objects::FactionStanding;

    async fn repository() -> SqliteCharacterRepository {
        let connection = SqliteConnection::in_memory().await.unwrap();
        connection.initialize_schema().await.unwrap();
        SqliteCharacterRepository::new(connection)
    }

    #[tokio::test]
    async fn test_upsert_round_trips_the_document() {
        let repo = repository().await;
        let pc = CharacterId::new();
        let mut character = Character::new("Nundro Rockseeker");
        character.add_memory(Memory::new("Captured by Black Spider", MemorySource::Import));
        character.set_standing(pc, FactionStanding::Dubious);
        character
            .extra
            .insert("homebrew_field".into(), serde_json::json!({"any": "shape"}));

        repo.upsert(&character).await.unwrap();
        let stored = repo.get(character.id).await.unwrap().unwrap();
        assert_eq!(stored, character);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let repo = repository().await;
        let mut character = Character::new("Tharden");
        repo.upsert(&character).await.unwrap();

        character.name = "Tharden Rockseeker".into();
        repo.upsert(&character).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(repo.find_by_name("Tharden").await.unwrap().is_none());
        let found = repo.find_by_name("tharden  ROCKSEEKER").await.unwrap().unwrap();
        assert_eq!(found.id, character.id);
    }

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let repo = repository().await;
        assert!(repo.get(CharacterId::new()).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
