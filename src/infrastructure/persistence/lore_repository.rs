//! Lore entry repository implementation for SQLite

use async_trait::async_trait;
use tracing::debug;

use super::connection::SqliteConnection;
use crate::application::ports::outbound::{LoreRepositoryPort, RepositoryError};
use crate::domain::entities::LoreEntry;
use crate::domain::value_objects::{slugify, LoreEntryId};

/// Repository for LoreEntry operations
pub struct SqliteLoreRepository {
    connection: SqliteConnection,
}

impl SqliteLoreRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn decode(document: &str) -> Result<LoreEntry, RepositoryError> {
    serde_json::from_str(document).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn database(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

#[async_trait]
impl LoreRepositoryPort for SqliteLoreRepository {
    async fn get(&self, id: LoreEntryId) -> Result<Option<LoreEntry>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT document FROM lore_entries WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(self.connection.pool())
                .await
                .map_err(database)?;

        row.map(|(document,)| decode(&document)).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<LoreEntry>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT document FROM lore_entries WHERE slug = ? ORDER BY name LIMIT 1",
        )
        .bind(slugify(name))
        .fetch_optional(self.connection.pool())
        .await
        .map_err(database)?;

        row.map(|(document,)| decode(&document)).transpose()
    }

    async fn list(&self) -> Result<Vec<LoreEntry>, RepositoryError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT document FROM lore_entries ORDER BY name")
                .fetch_all(self.connection.pool())
                .await
                .map_err(database)?;

        rows.iter().map(|(document,)| decode(document)).collect()
    }

    async fn upsert(&self, entry: &LoreEntry) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(entry)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO lore_entries (id, name, slug, document, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.name)
        .bind(entry.slug())
        .bind(document)
        .bind(entry.updated_at)
        .execute(self.connection.pool())
        .await
        .map_err(database)?;

        debug!(lore_id = %entry.id, "Upserted lore entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{CharacterId, LoreCategory};

    #[tokio::test]
    async fn test_lore_round_trip_and_lookup() {
        let connection = SqliteConnection::in_memory().await.unwrap();
        connection.initialize_schema().await.unwrap();
        let repo = SqliteLoreRepository::new(connection);

        let mut entry = LoreEntry::new("Cragmaw Hideout", LoreCategory::Location)
            .with_description("A goblin cave");
        entry.key_facts = vec!["Guarded by wolves".into()];
        entry.link_character(CharacterId::new());
        repo.upsert(&entry).await.unwrap();

        assert_eq!(repo.get(entry.id).await.unwrap().unwrap(), entry);
        assert_eq!(
            repo.find_by_name("cragmaw hideout").await.unwrap().unwrap().id,
            entry.id
        );
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
