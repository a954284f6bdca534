//! Contains the command handlers that front ends call to edit a workshop session.
//!
//! Each function corresponds to an `IpcMessage::command` (see [`super::handle_ipc_message`]).
//! Handlers mutate the `WorkshopState`, recompute hits, and emit `UserEvent`s.
//! Each returns `false` when the command failed. Nothing is written to disk
//! unless the command is explicitly a save or export.

use chrono::Local;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::PathBuf;

use super::events::UserEvent;
use super::helpers::{notify, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::WorkshopState;
use crate::core::error::CoreError;
use crate::core::materials::{self, ExampleList};
use crate::core::rule::{flags_from_value, unique_key};
use crate::core::{prompt, rule_pack, scope, seeds, Rule, Scope, ScopeContext};

/// The editable fields of a rule, as entered in a rule detail form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleEdit {
    pub name: String,
    pub why: String,
    /// Comma separated genre tags. Blank means no tags.
    pub genres: String,
    /// Flag bitmask as typed by the user. Non-integers reset the flags to 0.
    #[serde(deserialize_with = "flags_text")]
    pub flags: String,
    pub pattern: String,
}

/// Accepts the flags field as typed text or as a JSON number.
fn flags_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        number @ Value::Number(_) => match flags_from_value(&number) {
            Some(bits) => bits.to_string(),
            None => number.to_string(),
        },
        other => other.to_string(),
    })
}

/// Switches to the workspace at `path`, creating it if necessary.
pub fn open_workspace<P: EventProxy>(path: PathBuf, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        s.open_workspace(&path)?;
        s.status_message = format!("Opened {}", path.display());
        Ok(())
    })
}

/// Discards in-memory changes and reloads the workspace from disk.
pub fn reload_workspace<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        s.reload_workspace()?;
        s.status_message = "Workspace reloaded.".to_string();
        Ok(())
    })
}

/// Writes the workspace to its path.
pub fn save_workspace<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    let path = state.workspace_path.clone();
    let ok = match state.save_workspace() {
        Ok(()) => {
            state.status_message = format!("Saved {}", path.display());
            proxy.send_event(UserEvent::SaveComplete(true, path));
            true
        }
        Err(e) => {
            tracing::error!("Failed to save workspace: {}", e);
            state.status_message = e.to_string();
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            proxy.send_event(UserEvent::SaveComplete(false, path));
            false
        }
    };
    notify(state, &proxy);
    ok
}

/// Replaces the rule collection with the rules of a rule pack.
pub fn open_rule_pack<P: EventProxy>(path: PathBuf, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        s.workspace.rules = rule_pack::load(&path)?;
        s.rules_pack_path = path.clone();
        s.status_message = format!("Loaded {} rule(s) from {}", s.workspace.rules.len(), path.display());
        Ok(())
    })
}

/// Exports the rule collection as a rule pack, to `path` or the session default.
pub fn export_rule_pack<P: EventProxy>(
    path: Option<PathBuf>,
    proxy: P,
    state: &mut WorkshopState,
) -> bool {
    let path = path.unwrap_or_else(|| state.rules_pack_path.clone());
    match rule_pack::export(&path, &state.config.rules_pack_name, &state.workspace.rules) {
        Ok(()) => {
            state.rules_pack_path = path.clone();
            state.status_message = format!("Exported rule pack to {}", path.display());
            proxy.send_event(UserEvent::RulePackExported(true, path));
            true
        }
        Err(e) => {
            tracing::error!("Failed to export rule pack: {}", e);
            state.status_message = e.to_string();
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            proxy.send_event(UserEvent::RulePackExported(false, path));
            false
        }
    }
}

/// Appends a blank rule placed in the currently selected scope.
pub fn add_rule<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let n = s.workspace.rules.len();
        let key = unique_key(&s.workspace.rules, &format!("custom_{}", n));
        let genre = match &s.scope_context {
            ScopeContext::Genre(g) => g.clone(),
            _ => String::new(),
        };
        let rule = Rule::new(key.clone(), format!("New rule {}", n), "", "")
            .with_scope(s.scope_context.scope(), &genre);
        s.workspace.rules.push(rule);
        s.status_message = format!("Added rule {}", key);
        Ok(())
    })
}

/// Removes the rule with `key`.
pub fn delete_rule<P: EventProxy>(key: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let idx = s.rule_index(&key)?;
        s.workspace.rules.remove(idx);
        s.status_message = format!("Deleted rule {}", key);
        Ok(())
    })
}

/// Flips the enabled flag of the rule with `key`.
pub fn toggle_rule<P: EventProxy>(key: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let idx = s.rule_index(&key)?;
        let rule = &mut s.workspace.rules[idx];
        rule.enabled = !rule.enabled;
        s.status_message = format!(
            "Rule {} is now {}",
            key,
            if rule.enabled { "ON" } else { "OFF" }
        );
        Ok(())
    })
}

/// Applies a rule edit.
///
/// A blank name keeps the current one. An invalid flags value resets the
/// flags to 0 and reports an error, but the rest of the edit still applies.
pub fn apply_rule_edit<P: EventProxy>(
    key: String,
    edit: RuleEdit,
    proxy: P,
    state: &mut WorkshopState,
) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let idx = s.rule_index(&key)?;
        let rule = &mut s.workspace.rules[idx];

        let name = edit.name.trim();
        if !name.is_empty() {
            rule.name = name.to_string();
        }
        rule.why = edit.why.trim().to_string();

        let genres: Vec<String> = edit
            .genres
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        rule.genres = if genres.is_empty() { None } else { Some(genres) };

        rule.pattern = edit.pattern.trim().to_string();

        let flags_text = edit.flags.trim();
        let flags_result = if flags_text.is_empty() {
            Ok(0)
        } else {
            flags_text.parse::<u32>()
        };
        match flags_result {
            Ok(flags) => rule.flags = flags,
            Err(_) => {
                rule.flags = 0;
                tracing::warn!("Invalid flags '{}' for rule {}; reset to 0", flags_text, key);
                proxy.send_event(UserEvent::ShowError(format!(
                    "flags must be an integer (got '{}'); reset to 0",
                    flags_text
                )));
            }
        }
        s.status_message = format!("Updated rule {}", key);
        Ok(())
    })
}

/// Promotes the rule with `key` to the global scope.
pub fn promote_to_global<P: EventProxy>(key: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let idx = s.rule_index(&key)?;
        scope::promote_to_global(&mut s.workspace.rules[idx]);
        s.status_message = format!("Rule {} promoted to global", key);
        Ok(())
    })
}

/// Promotes the rule with `key` to the workspace's current genre.
pub fn promote_to_genre<P: EventProxy>(key: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let idx = s.rule_index(&key)?;
        let genre = s.workspace.genre.clone();
        scope::promote_to_genre(&mut s.workspace.rules[idx], &genre)?;
        s.status_message = format!("Rule {} promoted to genre {}", key, genre);
        Ok(())
    })
}

/// Removes all temporary rules and temporary ignore words.
pub fn clear_temporary_scope<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let ws = &mut s.workspace;
        let removed = scope::clear_temporary(&mut ws.rules, &mut ws.ignore);
        s.status_message = format!("Temporary scope cleared ({} rule(s) removed)", removed);
        Ok(())
    })
}

/// Selects the scope shown and edited. Genre scope follows the workspace genre.
pub fn set_scope<P: EventProxy>(scope: Scope, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        s.scope_context = ScopeContext::for_scope(scope, &s.workspace.genre);
        s.status_message = format!("Scope: {}", s.scope_context.label());
        Ok(())
    })
}

/// Changes the workspace's selected genre.
pub fn set_genre<P: EventProxy>(genre: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(CoreError::InvalidScope("genre name must not be blank".to_string()));
        }
        s.workspace.genre = genre.to_string();
        s.sync_scope_genre();
        s.status_message = format!("Genre: {}", genre);
        Ok(())
    })
}

/// Adds whitespace separated words to the ignore bucket of the current scope.
pub fn add_ignore_words<P: EventProxy>(text: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let added = s.workspace.ignore.add_tokens(&s.scope_context, &text);
        s.status_message = format!("Added {} ignore word(s)", added);
        Ok(())
    })
}

/// Removes one word from the ignore bucket of the current scope.
pub fn remove_ignore_word<P: EventProxy>(word: String, proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        s.workspace.ignore.remove(&s.scope_context, &word);
        s.status_message = format!("Removed ignore word '{}'", word);
        Ok(())
    })
}

/// Appends the starter rules that are not present yet.
pub fn add_starter_rules<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let words = s.workspace.ignore.effective_for_genre(&s.workspace.genre);
        let added = seeds::add_missing(&mut s.workspace.rules, &words);
        s.status_message = format!("Added {} starter rule(s)", added);
        Ok(())
    })
}

fn add_examples<P: EventProxy>(
    list: ExampleList,
    titles: Vec<String>,
    proxy: P,
    state: &mut WorkshopState,
) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let added = materials::add_examples(&mut s.workspace, list, &titles);
        s.status_message = format!("Added {} title(s) to {}", added, list.label());
        Ok(())
    })
}

/// Collects titles that carry noise. They leave the keep list.
pub fn add_exclude_examples<P: EventProxy>(titles: Vec<String>, proxy: P, state: &mut WorkshopState) -> bool {
    add_examples(ExampleList::Exclude, titles, proxy, state)
}

/// Collects titles that must stay unchanged. They leave the exclude list.
pub fn add_keep_examples<P: EventProxy>(titles: Vec<String>, proxy: P, state: &mut WorkshopState) -> bool {
    add_examples(ExampleList::Keep, titles, proxy, state)
}

pub fn remove_example<P: EventProxy>(
    list: ExampleList,
    title: String,
    proxy: P,
    state: &mut WorkshopState,
) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        if !materials::remove_example(&mut s.workspace, list, &title) {
            return Err(CoreError::ExampleNotFound(format!("'{}' in {}", title.trim(), list.label())));
        }
        s.status_message = format!("Removed '{}' from {}", title.trim(), list.label());
        Ok(())
    })
}

/// Empties both example lists.
pub fn clear_examples<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |s| {
        let removed = materials::clear_examples(&mut s.workspace);
        s.status_message = format!("Cleared {} example title(s)", removed);
        Ok(())
    })
}

/// Builds the rule request prompt for the workspace genre and sends it as
/// `PromptReady`.
pub fn build_ai_prompt<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    let text = prompt::build_ai_prompt(&state.workspace, &state.workspace.genre, Local::now());
    state.status_message = format!(
        "Prompt built from {} EX / {} KEEP title(s)",
        state.workspace.exclude_examples.len().min(prompt::MAX_PROMPT_EXCLUDE),
        state.workspace.keep_examples.len().min(prompt::MAX_PROMPT_KEEP)
    );
    proxy.send_event(UserEvent::PromptReady(text));
    true
}

/// Recomputes hits and re-sends the current snapshot.
pub fn refresh<P: EventProxy>(proxy: P, state: &mut WorkshopState) -> bool {
    with_state_and_notify(state, &proxy, |_| Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::Workspace;
    use std::sync::mpsc::{self, Receiver, Sender};

    fn setup(rules: Vec<Rule>) -> (WorkshopState, Sender<UserEvent>, Receiver<UserEvent>) {
        let ws = Workspace {
            genre: "Comics".to_string(),
            sample_titles: vec!["Show 01".to_string(), "Show 02".to_string()],
            rules,
            ..Default::default()
        };
        let state = WorkshopState::new(AppConfig::default(), ws, PathBuf::from("workspace.json"));
        let (tx, rx) = mpsc::channel();
        (state, tx, rx)
    }

    fn errors(rx: &Receiver<UserEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|e| match e {
                UserEvent::ShowError(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_add_rule_uses_current_scope() {
        let (mut state, tx, rx) = setup(vec![]);
        add_rule(tx.clone(), &mut state);
        assert_eq!(state.workspace.rules[0].scope, Scope::Temporary);

        set_scope(Scope::Genre, tx.clone(), &mut state);
        add_rule(tx, &mut state);
        let rule = &state.workspace.rules[1];
        assert_eq!(rule.scope, Scope::Genre);
        assert_eq!(rule.apply_genre, "Comics");
        assert_ne!(rule.key, state.workspace.rules[0].key);
        assert!(errors(&rx).is_empty());
    }

    #[test]
    fn test_apply_edit_with_invalid_flags_keeps_rest_of_edit() {
        let (mut state, tx, rx) = setup(vec![Rule::new("r", "old", "", "")]);
        let edit = RuleEdit {
            name: "  ".to_string(),
            why: " numbers ".to_string(),
            genres: "Comics, , Novels".to_string(),
            flags: "abc".to_string(),
            pattern: r"\d{2}$".to_string(),
        };
        apply_rule_edit("r".to_string(), edit, tx, &mut state);

        let rule = &state.workspace.rules[0];
        assert_eq!(rule.name, "old");
        assert_eq!(rule.why, "numbers");
        assert_eq!(rule.flags, 0);
        assert_eq!(rule.pattern, r"\d{2}$");
        assert_eq!(rule.genres, Some(vec!["Comics".to_string(), "Novels".to_string()]));
        assert_eq!(state.hits.get("r"), Some(2));
        assert_eq!(errors(&rx).len(), 1);
    }

    #[test]
    fn test_toggle_rule_updates_hits() {
        let (mut state, tx, _rx) = setup(vec![Rule::new("r", "r", "Show", "")]);
        assert_eq!(state.hits.get("r"), Some(2));
        toggle_rule("r".to_string(), tx, &mut state);
        assert!(!state.workspace.rules[0].enabled);
        assert_eq!(state.hits.get("r"), Some(0));
    }

    #[test]
    fn test_unknown_rule_key_reports_error() {
        let (mut state, tx, rx) = setup(vec![]);
        delete_rule("missing".to_string(), tx, &mut state);
        let errs = errors(&rx);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("missing"));
    }

    #[test]
    fn test_promote_to_genre_uses_workspace_genre() {
        let (mut state, tx, _rx) = setup(vec![Rule::new("r", "r", "x", "").with_scope(Scope::Temporary, "")]);
        promote_to_genre("r".to_string(), tx.clone(), &mut state);
        assert_eq!(state.workspace.rules[0].scope, Scope::Genre);
        assert_eq!(state.workspace.rules[0].apply_genre, "Comics");

        promote_to_global("r".to_string(), tx, &mut state);
        assert_eq!(state.workspace.rules[0].scope, Scope::Global);
        assert!(state.workspace.rules[0].apply_genre.is_empty());
    }

    #[test]
    fn test_set_genre_moves_genre_context() {
        let (mut state, tx, rx) = setup(vec![]);
        set_scope(Scope::Genre, tx.clone(), &mut state);
        set_genre("Novels".to_string(), tx.clone(), &mut state);
        assert_eq!(state.scope_context, ScopeContext::Genre("Novels".to_string()));

        set_genre("   ".to_string(), tx, &mut state);
        assert_eq!(state.workspace.genre, "Novels");
        assert_eq!(errors(&rx).len(), 1);
    }

    #[test]
    fn test_ignore_words_go_to_current_scope() {
        let (mut state, tx, _rx) = setup(vec![]);
        add_ignore_words("HQ raw".to_string(), tx.clone(), &mut state);
        assert_eq!(state.workspace.ignore.temporary, vec!["HQ", "raw"]);

        remove_ignore_word("HQ".to_string(), tx, &mut state);
        assert_eq!(state.workspace.ignore.temporary, vec!["raw"]);
    }

    #[test]
    fn test_commands_report_failure() {
        let (mut state, tx, _rx) = setup(vec![Rule::new("r", "r", "x", "")]);
        assert!(!promote_to_global("missing".to_string(), tx.clone(), &mut state));
        assert!(!set_genre(" ".to_string(), tx.clone(), &mut state));
        assert!(promote_to_global("r".to_string(), tx, &mut state));
    }

    #[test]
    fn test_rule_edit_accepts_numeric_flags() {
        let edit: RuleEdit = serde_json::from_str(r#"{"name":"n","flags":2}"#).unwrap();
        assert_eq!(edit.flags, "2");
        assert_eq!(edit.name, "n");

        let edit: RuleEdit = serde_json::from_str(r#"{"flags":18.0}"#).unwrap();
        assert_eq!(edit.flags, "18");
        let edit: RuleEdit = serde_json::from_str(r#"{"flags":null}"#).unwrap();
        assert_eq!(edit.flags, "");
        let edit: RuleEdit = serde_json::from_str(r#"{"flags":"8"}"#).unwrap();
        assert_eq!(edit.flags, "8");
        let edit: RuleEdit = serde_json::from_str(r#"{"flags":1.5}"#).unwrap();
        assert_eq!(edit.flags, "1.5");
    }

    #[test]
    fn test_example_commands_move_titles_between_lists() {
        let (mut state, tx, rx) = setup(vec![]);
        assert!(add_exclude_examples(vec!["Show 01".to_string(), "Show 02".to_string()], tx.clone(), &mut state));
        assert!(add_keep_examples(vec!["Show 02".to_string()], tx.clone(), &mut state));
        assert_eq!(state.workspace.exclude_examples, vec!["Show 01"]);
        assert_eq!(state.workspace.keep_examples, vec!["Show 02"]);

        assert!(!remove_example(ExampleList::Keep, "Show 01".to_string(), tx.clone(), &mut state));
        assert!(remove_example(ExampleList::Exclude, "Show 01".to_string(), tx.clone(), &mut state));
        assert!(clear_examples(tx, &mut state));
        assert!(state.workspace.keep_examples.is_empty());
        assert_eq!(errors(&rx).len(), 1);
    }

    #[test]
    fn test_build_ai_prompt_sends_prompt() {
        let (mut state, tx, rx) = setup(vec![]);
        add_exclude_examples(vec!["Show 01 [HQ]".to_string()], tx.clone(), &mut state);
        rx.try_iter().count();

        assert!(build_ai_prompt(tx, &mut state));
        let prompts: Vec<String> = rx
            .try_iter()
            .filter_map(|e| match e {
                UserEvent::PromptReady(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[Genre] Comics"));
        assert!(prompts[0].contains("- Show 01 [HQ]"));
    }

    #[test]
    fn test_every_command_emits_a_snapshot() {
        let (mut state, tx, rx) = setup(vec![]);
        refresh(tx, &mut state);
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events.as_slice(), [UserEvent::WorkspaceChanged(_)]));
    }
}
