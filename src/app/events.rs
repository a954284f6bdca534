//! Defines the event and message structures exchanged with whatever front end
//! currently owns the workshop session.

use serde::Deserialize;
use std::path::PathBuf;

use super::view_model::WorkshopView;

/// Events emitted by the session after handling a command.
#[derive(Debug)]
pub enum UserEvent {
    /// The workspace changed; carries a fresh snapshot for display.
    WorkspaceChanged(Box<WorkshopView>),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// The result of a workspace save operation.
    SaveComplete(bool, PathBuf),
    /// The result of a rule pack export.
    RulePackExported(bool, PathBuf),
    /// A rule request prompt built from the collected examples.
    PromptReady(String),
}

/// A message received from a front end over its command channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
