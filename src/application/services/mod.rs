//! Application services - Use case implementations
//!
//! Services accept repository and generator ports and return domain entities
//! or DTOs. The synchronizer fills the store from files; the dialogue service
//! runs turns against stored characters.

pub mod character_service;
pub mod dialogue_service;
pub mod history_loader;
pub mod llm;
pub mod merge_policy;
pub mod sync_service;
pub mod validation;

pub use character_service::{
    AddMemoryRequest, CharacterService, CharacterServiceImpl, CreateCharacterRequest,
};
pub use dialogue_service::DialogueService;
pub use history_loader::{HistoryContent, HistoryLoader, HistoryText, NO_HISTORY_CONTENT};
pub use sync_service::{IngestError, SyncService, SyncSources, SyncSummary};
pub use validation::ValidationError;
