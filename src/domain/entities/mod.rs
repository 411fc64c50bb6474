//! Domain entities - Core business objects with identity

mod character;
mod lore_entry;
mod memory;

pub use character::{
    dedup_preserving_order, Character, CharacterType, SheetImport, CHARACTER_SCHEMA_VERSION,
};
pub use lore_entry::{LoreEntry, LORE_SCHEMA_VERSION};
pub use memory::{Memory, MemorySource};
