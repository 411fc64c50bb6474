//! Data transfer objects exchanged with the surrounding service layer

mod dialogue;

pub use dialogue::{
    DialogueTurnRequest, StandingSuggestion, SuggestedTurnResult, TurnKind,
    DEFAULT_JUSTIFICATION, SYSTEM_DIRECTIVE_PREFIX,
};
