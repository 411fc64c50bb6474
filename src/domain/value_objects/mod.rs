//! Value objects - Immutable objects defined by their attributes

mod faction_standing;
mod ids;
mod lore_category;
mod settings;
mod slug;

pub use faction_standing::{FactionStanding, UnknownStanding};
pub use ids::*;
pub use lore_category::LoreCategory;
pub use settings::DialogueSettings;
pub use slug::slugify;
