//! SQLite persistence adapters
//!
//! Each entity is one JSON document per row, upserted by id.

mod character_repository;
mod connection;
mod lore_repository;

pub use character_repository::SqliteCharacterRepository;
pub use connection::SqliteConnection;
pub use lore_repository::SqliteLoreRepository;

use std::sync::Arc;

use anyhow::Result;

/// Combined repository providing access to all document repositories
#[derive(Clone)]
pub struct SqliteRepository {
    connection: SqliteConnection,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let connection = SqliteConnection::new(database_url).await?;
        connection.initialize_schema().await?;
        Ok(Self { connection })
    }

    pub fn characters(&self) -> Arc<SqliteCharacterRepository> {
        Arc::new(SqliteCharacterRepository::new(self.connection.clone()))
    }

    pub fn lore(&self) -> Arc<SqliteLoreRepository> {
        Arc::new(SqliteLoreRepository::new(self.connection.clone()))
    }
}
