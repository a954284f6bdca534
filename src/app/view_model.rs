//! Responsible for transforming the `WorkshopState` into a `WorkshopView` view model.
//!
//! Sorting happens here, on a copy of the visible rule indices. The stored rule
//! order, which decides first-match attribution, is never touched.

use serde::Serialize;
use std::path::Path;

use super::state::WorkshopState;
use crate::core::{Rule, Scope};

/// A serializable snapshot of the session for display.
#[derive(Serialize, Clone, Debug)]
pub struct WorkshopView {
    pub workspace_name: String,
    pub genre: String,
    pub scope_label: String,
    pub exclude_count: usize,
    pub keep_count: usize,
    pub sample_count: usize,
    pub rules: Vec<RuleRow>,
    pub ignore_words: Vec<String>,
    pub preview: String,
    pub status_message: String,
}

/// One row of the rule listing.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RuleRow {
    /// Position in the stored collection.
    pub index: usize,
    pub key: String,
    pub scope: String,
    pub enabled: bool,
    pub hits: usize,
    /// Rule name, with its genre tags appended when it has any.
    pub name: String,
    pub pattern: String,
    pub error: String,
}

/// Creates the complete `WorkshopView` from the current `WorkshopState`.
pub fn generate_view(state: &WorkshopState) -> WorkshopView {
    let ws = &state.workspace;
    WorkshopView {
        workspace_name: file_name(&state.workspace_path),
        genre: ws.genre.clone(),
        scope_label: state.scope_context.label(),
        exclude_count: ws.exclude_examples.len(),
        keep_count: ws.keep_examples.len(),
        sample_count: ws.sample_titles.len(),
        rules: rule_rows(state),
        ignore_words: ws.ignore.words(&state.scope_context).to_vec(),
        preview: state.preview().render(),
        status_message: state.status_message.clone(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Rows for the rules visible in the current scope, most hits first, then by name.
pub fn rule_rows(state: &WorkshopState) -> Vec<RuleRow> {
    let rules = &state.workspace.rules;
    let hits_of = |i: usize| state.hits.get(&rules[i].key).unwrap_or(0);

    let mut order: Vec<usize> = crate::core::scope::visible_indices(rules, &state.scope_context);
    order.sort_by(|&a, &b| {
        hits_of(b)
            .cmp(&hits_of(a))
            .then_with(|| rules[a].name.to_lowercase().cmp(&rules[b].name.to_lowercase()))
    });

    order
        .into_iter()
        .map(|i| row(i, &rules[i], hits_of(i)))
        .collect()
}

fn row(index: usize, rule: &Rule, hits: usize) -> RuleRow {
    let mut name = rule.name.clone();
    if let Some(genres) = rule.genres.as_ref().filter(|g| !g.is_empty()) {
        name.push_str(&format!(" (genres: {})", genres.join("/")));
    }
    RuleRow {
        index,
        key: rule.key.clone(),
        scope: scope_cell(rule),
        enabled: rule.enabled,
        hits,
        name,
        pattern: rule.pattern.clone(),
        error: rule.error.clone(),
    }
}

fn scope_cell(rule: &Rule) -> String {
    match rule.scope {
        Scope::Temporary => "TMP".to_string(),
        Scope::Global => "global".to_string(),
        Scope::Genre => format!("genre:{}", rule.apply_genre),
    }
}
