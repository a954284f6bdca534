//! Scope visibility, promotion and the clear-temporary bulk operation.

use super::error::{CoreError, CoreResult};
use super::ignore::IgnoreWords;
use super::rule::{Rule, Scope};

/// The scope currently selected for viewing or editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScopeContext {
    #[default]
    Temporary,
    Global,
    Genre(String),
}

impl ScopeContext {
    /// Builds the context for `scope`, using `genre` when it is genre-scoped.
    pub fn for_scope(scope: Scope, genre: &str) -> Self {
        match scope {
            Scope::Temporary => ScopeContext::Temporary,
            Scope::Global => ScopeContext::Global,
            Scope::Genre => ScopeContext::Genre(genre.to_string()),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            ScopeContext::Temporary => Scope::Temporary,
            ScopeContext::Global => Scope::Global,
            ScopeContext::Genre(_) => Scope::Genre,
        }
    }

    /// Returns `true` if `rule` belongs to this context.
    pub fn is_visible(&self, rule: &Rule) -> bool {
        match self {
            ScopeContext::Temporary => rule.scope == Scope::Temporary,
            ScopeContext::Global => rule.scope == Scope::Global,
            ScopeContext::Genre(genre) => rule.scope == Scope::Genre && rule.apply_genre == *genre,
        }
    }

    /// Short label used in listings, e.g. `TMP`, `global`, `genre:Comics`.
    pub fn label(&self) -> String {
        match self {
            ScopeContext::Temporary => "TMP".to_string(),
            ScopeContext::Global => "global".to_string(),
            ScopeContext::Genre(genre) => format!("genre:{}", genre),
        }
    }
}

/// Indices of the rules visible in `context`, in storage order.
pub fn visible_indices(rules: &[Rule], context: &ScopeContext) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, r)| context.is_visible(r))
        .map(|(i, _)| i)
        .collect()
}

/// Moves a rule to the global scope, clearing its genre.
pub fn promote_to_global(rule: &mut Rule) {
    rule.scope = Scope::Global;
    rule.apply_genre.clear();
}

/// Moves a rule to the genre scope for `current_genre`.
///
/// Fails when `current_genre` is blank, which would break the scope invariant.
pub fn promote_to_genre(rule: &mut Rule, current_genre: &str) -> CoreResult<()> {
    let genre = current_genre.trim();
    if genre.is_empty() {
        return Err(CoreError::InvalidScope(format!(
            "cannot promote '{}' to a genre without an active genre",
            rule.key
        )));
    }
    rule.scope = Scope::Genre;
    rule.apply_genre = genre.to_string();
    Ok(())
}

/// Removes every temporary rule and empties the temporary ignore bucket.
///
/// Returns the number of rules removed.
pub fn clear_temporary(rules: &mut Vec<Rule>, ignore: &mut IgnoreWords) -> usize {
    let before = rules.len();
    rules.retain(|r| r.scope != Scope::Temporary);
    ignore.temporary.clear();
    let removed = before - rules.len();
    tracing::info!("Cleared temporary scope: {} rule(s) removed", removed);
    removed
}
