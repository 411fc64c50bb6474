//! Shared application state

use std::sync::Arc;

use anyhow::Result;

use crate::application::ports::outbound::{CharacterRepositoryPort, LoreRepositoryPort};
use crate::application::services::{
    CharacterServiceImpl, DialogueService, HistoryLoader, SyncService,
};
use crate::domain::value_objects::DialogueSettings;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::persistence::SqliteRepository;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    // Application services
    pub sync_service: SyncService,
    pub character_service: CharacterServiceImpl,
    pub dialogue_service: DialogueService<OllamaClient>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let repository = SqliteRepository::new(&config.database_url).await?;
        let characters: Arc<dyn CharacterRepositoryPort> = repository.characters();
        let lore: Arc<dyn LoreRepositoryPort> = repository.lore();

        let settings = DialogueSettings::from_env();
        let history = HistoryLoader::new(&config.history_dir);
        let llm_client = OllamaClient::new(&config.ollama_base_url, &config.ollama_model);

        let sync_service = SyncService::new(characters.clone(), lore.clone(), settings.clone());
        let character_service = CharacterServiceImpl::new(
            characters.clone(),
            lore.clone(),
            history.clone(),
            settings.clone(),
        );
        let dialogue_service = DialogueService::new(
            llm_client,
            characters,
            lore,
            history,
            settings,
        );

        Ok(Self {
            config,
            sync_service,
            character_service,
            dialogue_service,
        })
    }
}
