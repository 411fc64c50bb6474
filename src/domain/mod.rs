//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Character, Memory, LoreEntry
//! - Value Objects: typed ids, faction standings, lore categories, settings

pub mod entities;
pub mod value_objects;
