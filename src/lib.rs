//! Chronicler Engine - character records and dialogue turns for TTRPG tables
//!
//! The engine keeps canonical character and lore records in a document
//! store, filled by a synchronizer that merges hand-authored definitions,
//! virtual-tabletop sheet exports and history text files. Dialogue turns
//! assemble generation context from a stored character, call an external
//! generator and parse its reply into structured suggestions.

pub mod application;
pub mod domain;
pub mod infrastructure;
