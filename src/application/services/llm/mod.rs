//! Generation context assembly and response parsing

mod prompt_builder;
mod suggestion_parser;

pub use prompt_builder::{
    build_context, ContextInputs, ContextSection, GenerationContext, SectionKind,
};
pub use suggestion_parser::{
    parse_suggestions, standing_key, ACTION_KEY, CHECK_KEY, JUSTIFICATION_KEY,
    NEUTRAL_DIALOGUE, STANDING_KEY_PREFIX, TOPICS_KEY, UNKNOWN_COUNTERPART,
};
