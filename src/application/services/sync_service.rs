//! Sync Service - reconciles on-disk sources into canonical records
//!
//! Character definitions in the primary directory are merged with a matching
//! virtual-tabletop actor export and the canonical history file, then
//! upserted one record at a time. Lore files are ingested the same way.
//!
//! The batch is sequential and tolerant: a file that cannot be read, parsed or
//! validated is logged and skipped, and the remaining files still sync. A
//! record identical to the stored one is never rewritten, so running the sync
//! twice over unchanged sources performs no writes the second time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::history_loader::HistoryLoader;
use super::merge_policy::{merge_character, sheet_import_fields, MergeInputs};
use super::validation::{validate_character, validate_lore_entry, ValidationError};
use crate::application::ports::outbound::{
    CharacterRepositoryPort, LoreRepositoryPort, RepositoryError,
};
use crate::domain::entities::{LoreEntry, LORE_SCHEMA_VERSION};
use crate::domain::value_objects::{slugify, CharacterId, DialogueSettings, LoreEntryId};

/// Extension of the canonical per-character history file
pub const HISTORY_FILE_EXTENSION: &str = "txt";

/// File name prefix of actor exports, compared through slugs
const ACTOR_EXPORT_PREFIX: &str = "fvtt-actor-";

/// Where the sync reads from
#[derive(Debug, Clone, Default)]
pub struct SyncSources {
    pub primary_dir: PathBuf,
    pub sheet_import_dir: Option<PathBuf>,
    pub history_dir: Option<PathBuf>,
    pub lore_dir: Option<PathBuf>,
}

/// Aggregate counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl SyncSummary {
    /// Number of store writes the batch performed
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }

    fn record(&mut self, outcome: &Result<SyncOutcome, IngestError>) {
        self.processed += 1;
        match outcome {
            Ok(SyncOutcome::Created) => self.created += 1,
            Ok(SyncOutcome::Updated) => self.updated += 1,
            Ok(SyncOutcome::Unchanged) => self.unchanged += 1,
            Err(_) => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Why one source file (or lore entry) was skipped
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} has no usable `name` field")]
    MissingName { path: PathBuf },
    #[error("{path} does not match the record schema: {source}")]
    Schema {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} failed validation: {source}")]
    Validation {
        path: PathBuf,
        source: ValidationError,
    },
    #[error("{name} duplicates a record already synced from {first}")]
    Duplicate { name: String, first: PathBuf },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct SyncService {
    characters: Arc<dyn CharacterRepositoryPort>,
    lore: Arc<dyn LoreRepositoryPort>,
    settings: DialogueSettings,
}

impl SyncService {
    pub fn new(
        characters: Arc<dyn CharacterRepositoryPort>,
        lore: Arc<dyn LoreRepositoryPort>,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            characters,
            lore,
            settings,
        }
    }

    /// Sync characters, then lore when a lore directory is configured
    pub async fn sync_all(&self, sources: &SyncSources) -> Result<(SyncSummary, SyncSummary)> {
        let characters = self.sync_characters(sources).await?;
        let lore = match &sources.lore_dir {
            Some(dir) => self.sync_lore(dir).await?,
            None => SyncSummary::default(),
        };
        Ok((characters, lore))
    }

    /// Merge every character definition in the primary directory
    #[instrument(skip(self, sources), fields(primary_dir = %sources.primary_dir.display()))]
    pub async fn sync_characters(&self, sources: &SyncSources) -> Result<SyncSummary> {
        let definitions = list_json_files(&sources.primary_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to list character definitions in {}",
                    sources.primary_dir.display()
                )
            })?;

        let sheet_exports = match &sources.sheet_import_dir {
            Some(dir) => list_json_files(dir).await.unwrap_or_else(|e| {
                warn!(dir = %dir.display(), error = %e, "Sheet import directory unavailable");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let history = sources.history_dir.as_ref().map(HistoryLoader::new);

        let mut summary = SyncSummary::default();
        let mut seen_slugs: Vec<(String, PathBuf)> = Vec::new();

        for path in &definitions {
            let outcome = self
                .sync_character_file(path, &sheet_exports, history.as_ref(), &mut seen_slugs)
                .await;
            match &outcome {
                Ok(result) => debug!(file = %path.display(), ?result, "Synced character file"),
                Err(e) => warn!(file = %path.display(), error = %e, "Skipping character file"),
            }
            summary.record(&outcome);
        }

        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "Character sync finished"
        );
        Ok(summary)
    }

    async fn sync_character_file(
        &self,
        path: &Path,
        sheet_exports: &[PathBuf],
        history: Option<&HistoryLoader>,
        seen_slugs: &mut Vec<(String, PathBuf)>,
    ) -> Result<SyncOutcome, IngestError> {
        let primary = read_json_object(path).await?;
        let name = primary
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| IngestError::MissingName {
                path: path.to_path_buf(),
            })?
            .to_string();

        let slug = slugify(&name);
        if let Some((_, first)) = seen_slugs.iter().find(|(s, _)| *s == slug) {
            return Err(IngestError::Duplicate {
                name,
                first: first.clone(),
            });
        }
        seen_slugs.push((slug.clone(), path.to_path_buf()));

        let import = match find_sheet_export(&slug, sheet_exports) {
            Some(export_path) => match read_json_object(export_path).await {
                Ok(export) => {
                    debug!(character = %name, export = %export_path.display(), "Matched sheet import");
                    Some(sheet_import_fields(&export))
                }
                Err(e) => {
                    warn!(character = %name, error = %e, "Ignoring unreadable sheet import");
                    None
                }
            },
            None => None,
        };

        let existing = match primary
            .get("id")
            .or_else(|| primary.get("_id"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<CharacterId>().ok())
        {
            Some(id) => match self.characters.get(id).await? {
                Some(found) => Some(found),
                None => self.characters.find_by_name(&name).await?,
            },
            None => self.characters.find_by_name(&name).await?,
        };

        // Only new records pick up the canonical history file, so a file the
        // GM dissociated later stays dissociated
        let canonical_history = format!("{}.{}", name, HISTORY_FILE_EXTENSION);
        let canonical_history = match history {
            Some(loader) if existing.is_none() && loader.exists(&canonical_history).await => {
                Some(canonical_history)
            }
            _ => None,
        };

        let candidate = merge_character(MergeInputs {
            primary: &primary,
            import: import.as_ref(),
            existing: existing.as_ref(),
            canonical_history_file: canonical_history.as_deref(),
        })
        .map_err(|source| IngestError::Schema {
            path: path.to_path_buf(),
            source,
        })?;

        validate_character(&candidate, &self.settings).map_err(|source| {
            IngestError::Validation {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let outcome = match &existing {
            Some(stored) if *stored == candidate => return Ok(SyncOutcome::Unchanged),
            Some(_) => SyncOutcome::Updated,
            None => SyncOutcome::Created,
        };

        self.characters.upsert(&candidate).await?;
        Ok(outcome)
    }

    /// Ingest every lore file; a file holds one entry or a list of entries
    #[instrument(skip(self), fields(lore_dir = %lore_dir.display()))]
    pub async fn sync_lore(&self, lore_dir: &Path) -> Result<SyncSummary> {
        let files = list_json_files(lore_dir)
            .await
            .with_context(|| format!("Failed to list lore files in {}", lore_dir.display()))?;

        let mut summary = SyncSummary::default();
        let mut seen: Vec<(String, PathBuf)> = Vec::new();

        for path in &files {
            let entries = match read_json(path).await {
                Ok(Value::Array(items)) => items,
                Ok(single @ Value::Object(_)) => vec![single],
                Ok(_) => {
                    warn!(file = %path.display(), "Lore file is neither an object nor a list");
                    summary.processed += 1;
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping lore file");
                    summary.processed += 1;
                    summary.skipped += 1;
                    continue;
                }
            };

            for entry in entries {
                let outcome = self.sync_lore_entry(path, entry, &mut seen).await;
                if let Err(e) = &outcome {
                    warn!(file = %path.display(), error = %e, "Skipping lore entry");
                }
                summary.record(&outcome);
            }
        }

        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "Lore sync finished"
        );
        Ok(summary)
    }

    async fn sync_lore_entry(
        &self,
        path: &Path,
        entry: Value,
        seen: &mut Vec<(String, PathBuf)>,
    ) -> Result<SyncOutcome, IngestError> {
        let Value::Object(source) = entry else {
            return Err(IngestError::MissingName {
                path: path.to_path_buf(),
            });
        };
        let name = source
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| IngestError::MissingName {
                path: path.to_path_buf(),
            })?
            .to_string();

        let slug = slugify(&name);
        if let Some((_, first)) = seen.iter().find(|(s, _)| *s == slug) {
            return Err(IngestError::Duplicate {
                name,
                first: first.clone(),
            });
        }
        seen.push((slug, path.to_path_buf()));

        let source_id: Option<LoreEntryId> = ["id", "lore_id", "_id"]
            .iter()
            .filter_map(|k| source.get(*k).and_then(Value::as_str))
            .find_map(|s| s.parse().ok());

        let existing = match source_id {
            Some(id) => match self.lore.get(id).await? {
                Some(found) => Some(found),
                None => self.lore.find_by_name(&name).await?,
            },
            None => self.lore.find_by_name(&name).await?,
        };

        let mut document = match &existing {
            Some(stored) => match serde_json::to_value(stored) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        for (key, value) in source {
            if matches!(
                key.as_str(),
                "id" | "lore_id" | "_id" | "created_at" | "updated_at" | "schema_version"
            ) {
                continue;
            }
            let key = if key == "lore_type" { "category".to_string() } else { key };
            document.insert(key, value);
        }
        let id = source_id
            .or_else(|| existing.as_ref().map(|e| e.id))
            .unwrap_or_default();
        document.insert("id".into(), Value::String(id.to_string()));
        document.insert("schema_version".into(), Value::from(LORE_SCHEMA_VERSION));

        let mut candidate: LoreEntry =
            serde_json::from_value(Value::Object(document)).map_err(|source| {
                IngestError::Schema {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        validate_lore_entry(&candidate, &self.settings).map_err(|source| {
            IngestError::Validation {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let outcome = match &existing {
            Some(stored) if stored.same_content_as(&candidate) => {
                return Ok(SyncOutcome::Unchanged)
            }
            Some(stored) => {
                candidate.created_at = stored.created_at;
                SyncOutcome::Updated
            }
            None => {
                candidate.created_at = Utc::now();
                SyncOutcome::Created
            }
        };
        candidate.updated_at = Utc::now();

        self.lore.upsert(&candidate).await?;
        Ok(outcome)
    }
}

/// Regular `.json` files directly inside `dir`, sorted by name
async fn list_json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn read_json(path: &Path) -> Result<Value, IngestError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| IngestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

async fn read_json_object(path: &Path) -> Result<Map<String, Value>, IngestError> {
    match read_json(path).await? {
        Value::Object(map) => Ok(map),
        _ => Err(IngestError::MissingName {
            path: path.to_path_buf(),
        }),
    }
}

/// Pick the actor export whose slugged name starts with the character slug.
/// An exact slug match beats a prefix match; ties go to the first file.
fn find_sheet_export<'a>(slug: &str, exports: &'a [PathBuf]) -> Option<&'a PathBuf> {
    if slug.is_empty() {
        return None;
    }
    let prefixed = format!("{}-", slug);
    let mut prefix_match = None;

    for path in exports {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let stem = slugify(stem);
        let rest = stem.strip_prefix(ACTOR_EXPORT_PREFIX).unwrap_or(&stem);
        if rest == slug {
            return Some(path);
        }
        if prefix_match.is_none() && rest.starts_with(&prefixed) {
            prefix_match = Some(path);
        }
    }
    prefix_match
}
