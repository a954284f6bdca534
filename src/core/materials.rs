//! Example titles collected while building rules.
//!
//! A title is either an exclude example (it carries noise a rule should strip)
//! or a keep example (it is already clean). The two lists never share a title.

use serde::{Deserialize, Serialize};

use super::workspace::Workspace;

/// Which example list a title belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleList {
    Exclude,
    Keep,
}

impl ExampleList {
    pub fn label(self) -> &'static str {
        match self {
            ExampleList::Exclude => "EX",
            ExampleList::Keep => "KEEP",
        }
    }
}

fn lists_mut(ws: &mut Workspace, list: ExampleList) -> (&mut Vec<String>, &mut Vec<String>) {
    match list {
        ExampleList::Exclude => (&mut ws.exclude_examples, &mut ws.keep_examples),
        ExampleList::Keep => (&mut ws.keep_examples, &mut ws.exclude_examples),
    }
}

/// Adds `titles` to `list`, moving them out of the other list.
///
/// Titles are trimmed; blank titles and titles already in `list` are skipped.
/// Returns how many titles were newly added.
pub fn add_examples<S: AsRef<str>>(ws: &mut Workspace, list: ExampleList, titles: &[S]) -> usize {
    let (target, other) = lists_mut(ws, list);
    let mut added = 0;
    for title in titles {
        let title = title.as_ref().trim();
        if title.is_empty() {
            continue;
        }
        other.retain(|t| t != title);
        if !target.iter().any(|t| t == title) {
            target.push(title.to_string());
            added += 1;
        }
    }
    added
}

/// Removes `title` from `list`. Returns `true` if it was present.
pub fn remove_example(ws: &mut Workspace, list: ExampleList, title: &str) -> bool {
    let (target, _) = lists_mut(ws, list);
    let before = target.len();
    target.retain(|t| t != title.trim());
    before != target.len()
}

/// Empties both example lists. Returns how many titles were removed.
pub fn clear_examples(ws: &mut Workspace) -> usize {
    let removed = ws.exclude_examples.len() + ws.keep_examples.len();
    ws.exclude_examples.clear();
    ws.keep_examples.clear();
    removed
}
