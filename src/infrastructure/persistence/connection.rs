//! SQLite connection management

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Tables holding one JSON document per record
pub(crate) const DOCUMENT_TABLES: &[&str] = &["characters", "lore_entries"];

/// Wrapper around the SQLite pool
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open SQLite database at {}", database_url))?;

        info!("Connected to SQLite at {}", database_url);
        Ok(Self { pool })
    }

    /// Private in-memory database; a single connection keeps it alive
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    pub async fn initialize_schema(&self) -> Result<()> {
        for table in DOCUMENT_TABLES {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    slug TEXT NOT NULL,
                    document TEXT NOT NULL,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )
                "#
            ))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create table {}", table))?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_slug ON {table} (slug)"
            ))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to index table {}", table))?;
        }

        info!("SQLite schema initialized");
        Ok(())
    }
}
