//! The persisted workspace: examples, sample titles, ignore words and rules.
//!
//! The on-disk document may come from older versions that only carried a flat
//! `ignore_words` list. [`WorkspaceDocument::migrate`] resolves that once at
//! load time so the rest of the crate only ever sees [`Workspace`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::error::{CoreError, CoreResult};
use super::ignore::IgnoreWords;
use super::rule::{rules_from_values, Rule};

/// Genre name used when the document does not select one.
pub const UNSELECTED_GENRE: &str = "unselected";

/// The working state of one curation session.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    /// Currently selected genre (free text).
    pub genre: String,
    /// Titles believed to contain noise.
    pub exclude_examples: Vec<String>,
    /// Titles believed to be clean.
    pub keep_examples: Vec<String>,
    /// General corpus used for hit testing.
    pub sample_titles: Vec<String>,
    pub ignore: IgnoreWords,
    pub rules: Vec<Rule>,
    /// Top-level fields this crate does not interpret, kept for the browsing tool.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            genre: UNSELECTED_GENRE.to_string(),
            exclude_examples: Vec::new(),
            keep_examples: Vec::new(),
            sample_titles: Vec::new(),
            ignore: IgnoreWords::default(),
            rules: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Where the ignore words of a document come from.
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreSchema {
    /// Current format: `ignore_scoped`.
    Scoped(IgnoreWords),
    /// Old format: a flat `ignore_words` list, migrated to global.
    Legacy(Vec<String>),
    /// Neither is present.
    Absent,
}

/// The raw document as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default)]
    pub exclude_examples: Option<Vec<String>>,
    #[serde(default)]
    pub keep_examples: Option<Vec<String>>,
    #[serde(default)]
    pub sample_titles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_scoped: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_words: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Option<Vec<serde_json::Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorkspaceDocument {
    /// Determines which ignore-word schema the document uses.
    pub fn ignore_schema(&self) -> IgnoreSchema {
        let scoped = self
            .ignore_scoped
            .as_ref()
            .filter(|v| v.is_object())
            .and_then(|v| match serde_json::from_value::<IgnoreWords>(v.clone()) {
                Ok(words) => Some(words),
                Err(e) => {
                    tracing::warn!("Ignoring malformed ignore_scoped section: {}", e);
                    None
                }
            });
        match (scoped, &self.ignore_words) {
            (Some(words), _) => IgnoreSchema::Scoped(words),
            (None, Some(flat)) => IgnoreSchema::Legacy(flat.clone()),
            (None, None) => IgnoreSchema::Absent,
        }
    }

    /// Converts the raw document into a [`Workspace`], applying the legacy migration.
    pub fn migrate(self) -> Workspace {
        let ignore = match self.ignore_schema() {
            IgnoreSchema::Scoped(mut words) => {
                words.sanitize();
                words
            }
            IgnoreSchema::Legacy(flat) => {
                tracing::info!("Migrating {} legacy ignore word(s) to the global scope", flat.len());
                IgnoreWords::from_legacy(flat)
            }
            IgnoreSchema::Absent => IgnoreWords::default(),
        };

        let genre = self
            .genre
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| UNSELECTED_GENRE.to_string());

        Workspace {
            genre,
            exclude_examples: self.exclude_examples.unwrap_or_default(),
            keep_examples: self.keep_examples.unwrap_or_default(),
            sample_titles: self.sample_titles.unwrap_or_default(),
            ignore,
            rules: rules_from_values(self.rules.unwrap_or_default()),
            extra: self.extra,
        }
    }
}

impl Workspace {
    /// Builds the on-disk document for this workspace.
    pub fn to_document(&self) -> CoreResult<WorkspaceDocument> {
        let rules = self
            .rules
            .iter()
            .map(|r| serde_json::to_value(r.to_record()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WorkspaceDocument {
            genre: Some(self.genre.clone()),
            exclude_examples: Some(self.exclude_examples.clone()),
            keep_examples: Some(self.keep_examples.clone()),
            sample_titles: Some(self.sample_titles.clone()),
            ignore_scoped: Some(serde_json::to_value(&self.ignore)?),
            ignore_words: None,
            rules: Some(rules),
            extra: self.extra.clone(),
        })
    }
}

/// Parses a workspace from JSON text. `path` is only used for error reporting.
pub fn parse(content: &str, path: &Path) -> CoreResult<Workspace> {
    let document: WorkspaceDocument =
        serde_json::from_str(content).map_err(|source| CoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(document.migrate())
}

/// Loads the workspace stored at `path`.
pub fn load(path: &Path) -> CoreResult<Workspace> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
    let workspace = parse(&content, path)?;
    tracing::info!(
        "Loaded workspace from {:?} ({} rule(s), {} sample title(s))",
        path,
        workspace.rules.len(),
        workspace.sample_titles.len()
    );
    Ok(workspace)
}

/// Saves `workspace` to `path` without ever leaving a truncated document behind.
pub fn save(path: &Path, workspace: &Workspace) -> CoreResult<()> {
    let document = workspace.to_document()?;
    write_json_atomic(path, &document)?;
    tracing::info!("Saved workspace to {:?}", path);
    Ok(())
}

/// Loads the workspace at `path`, creating one with empty defaults if it is absent.
pub fn load_or_create(path: &Path) -> CoreResult<Workspace> {
    match load(path) {
        Err(CoreError::NotFound(_)) => {
            tracing::info!("Workspace not found, creating default workspace at {:?}", path);
            let workspace = Workspace::default();
            save(path, &workspace)?;
            Ok(workspace)
        }
        other => other,
    }
}

/// Serializes `value` as pretty JSON into a temporary file next to `path`,
/// then renames it over `path`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| CoreError::Io(e, dir.to_path_buf()))?;
    }

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CoreError::Io(e, dir.to_path_buf()))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CoreError::Io(e, tmp.path().to_path_buf()))?;
    tmp.persist(path)
        .map_err(|e| CoreError::Io(e.error, path.to_path_buf()))?;
    Ok(())
}
