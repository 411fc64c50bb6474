//! Chronicler Engine - character record sync and NPC dialogue turns
//!
//! Usage:
//!   chronicler-engine                                  sync sources into the store
//!   chronicler-engine turn <character-name> <request.json>
//!                                                      run one dialogue turn

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chronicler_engine::application::dto::DialogueTurnRequest;
use chronicler_engine::application::services::CharacterService;
use chronicler_engine::infrastructure::config::AppConfig;
use chronicler_engine::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chronicler_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Chronicler Engine");

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Data: {}", config.data_dir.display());
    tracing::info!("  Ollama: {} ({})", config.ollama_base_url, config.ollama_model);

    let state = AppState::new(config).await?;

    if state.config.sync_on_startup {
        let (characters, lore) = state
            .sync_service
            .sync_all(&state.config.sync_sources())
            .await
            .context("Startup sync failed")?;
        tracing::info!(
            characters_processed = characters.processed,
            characters_written = characters.writes(),
            characters_skipped = characters.skipped,
            lore_processed = lore.processed,
            lore_written = lore.writes(),
            lore_skipped = lore.skipped,
            "Startup sync complete"
        );
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(()),
        [command, name, request_path] if command == "turn" => {
            run_turn(&state, name, Path::new(request_path)).await
        }
        _ => anyhow::bail!("usage: chronicler-engine [turn <character-name> <request.json>]"),
    }
}

async fn run_turn(state: &AppState, name: &str, request_path: &Path) -> Result<()> {
    let character = state
        .character_service
        .find_character(name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Character not found: {}", name))?;

    let raw = tokio::fs::read_to_string(request_path)
        .await
        .with_context(|| format!("Failed to read {}", request_path.display()))?;
    let request: DialogueTurnRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid turn request in {}", request_path.display()))?;

    let result = state.dialogue_service.run_turn(&character, &request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
