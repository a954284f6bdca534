//! The session layer: owns a `WorkshopState`, runs commands against it, and
//! reports back through an [`proxy::EventProxy`].

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod view_model;

use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::core::ExampleList;
use events::{IpcMessage, UserEvent};
use proxy::EventProxy;
use state::WorkshopState;

fn payload<T: DeserializeOwned, P: EventProxy>(
    command: &str,
    payload: serde_json::Value,
    proxy: &P,
) -> Option<T> {
    match serde_json::from_value::<T>(payload.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                "Failed to deserialize payload for '{}': {} ({:?})",
                command,
                e,
                payload
            );
            proxy.send_event(UserEvent::ShowError(format!(
                "Invalid payload for '{}': {}",
                command, e
            )));
            None
        }
    }
}

/// Parses a JSON command message from a front end and dispatches it.
pub fn handle_ipc_message<P: EventProxy>(message: &str, proxy: P, state: &mut WorkshopState) {
    let msg: IpcMessage = match serde_json::from_str(message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!("Failed to parse IPC message: {}", e);
            return;
        }
    };
    tracing::debug!("IPC command: {}", msg.command);

    let cmd = msg.command.as_str();
    let p = msg.payload;
    let ok = match cmd {
        "openWorkspace" => payload::<PathBuf, _>(cmd, p, &proxy)
            .is_some_and(|path| commands::open_workspace(path, proxy, state)),
        "reloadWorkspace" => commands::reload_workspace(proxy, state),
        "saveWorkspace" => commands::save_workspace(proxy, state),
        "openRulePack" => payload::<PathBuf, _>(cmd, p, &proxy)
            .is_some_and(|path| commands::open_rule_pack(path, proxy, state)),
        "exportRulePack" => payload::<Option<PathBuf>, _>(cmd, p, &proxy)
            .is_some_and(|path| commands::export_rule_pack(path, proxy, state)),
        "addRule" => commands::add_rule(proxy, state),
        "deleteRule" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|key| commands::delete_rule(key, proxy, state)),
        "toggleRule" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|key| commands::toggle_rule(key, proxy, state)),
        "applyRuleEdit" => {
            #[derive(serde::Deserialize)]
            struct Payload {
                key: String,
                #[serde(flatten)]
                edit: commands::RuleEdit,
            }
            payload::<Payload, _>(cmd, p, &proxy)
                .is_some_and(|Payload { key, edit }| commands::apply_rule_edit(key, edit, proxy, state))
        }
        "promoteToGlobal" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|key| commands::promote_to_global(key, proxy, state)),
        "promoteToGenre" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|key| commands::promote_to_genre(key, proxy, state)),
        "clearTemporaryScope" => commands::clear_temporary_scope(proxy, state),
        "setScope" => payload(cmd, p, &proxy).is_some_and(|scope| commands::set_scope(scope, proxy, state)),
        "setGenre" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|genre| commands::set_genre(genre, proxy, state)),
        "addIgnoreWords" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|text| commands::add_ignore_words(text, proxy, state)),
        "removeIgnoreWord" => payload::<String, _>(cmd, p, &proxy)
            .is_some_and(|word| commands::remove_ignore_word(word, proxy, state)),
        "addExcludeExamples" => payload::<Vec<String>, _>(cmd, p, &proxy)
            .is_some_and(|titles| commands::add_exclude_examples(titles, proxy, state)),
        "addKeepExamples" => payload::<Vec<String>, _>(cmd, p, &proxy)
            .is_some_and(|titles| commands::add_keep_examples(titles, proxy, state)),
        "removeExample" => {
            #[derive(serde::Deserialize)]
            struct Payload {
                list: ExampleList,
                title: String,
            }
            payload::<Payload, _>(cmd, p, &proxy)
                .is_some_and(|Payload { list, title }| commands::remove_example(list, title, proxy, state))
        }
        "clearExamples" => commands::clear_examples(proxy, state),
        "buildAiPrompt" => commands::build_ai_prompt(proxy, state),
        "addStarterRules" => commands::add_starter_rules(proxy, state),
        "refresh" => commands::refresh(proxy, state),
        _ => {
            tracing::warn!("Unknown IPC command: {}", cmd);
            false
        }
    };
    if !ok {
        tracing::debug!("IPC command '{}' did not complete", cmd);
    }
}
