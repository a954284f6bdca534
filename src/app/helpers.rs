//! Contains helper functions to reduce boilerplate code in other `app` modules.

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::WorkshopState;
use super::view_model::generate_view;
use crate::core::CoreResult;

/// Performs a mutation on the session, recomputes hits, and sends a
/// `WorkspaceChanged` event.
///
/// If the mutation fails, a `ShowError` event is sent first; the snapshot is
/// still emitted so the front end reflects whatever state remains. Returns
/// whether the mutation succeeded.
pub fn with_state_and_notify<F, P: EventProxy>(state: &mut WorkshopState, proxy: &P, update_fn: F) -> bool
where
    F: FnOnce(&mut WorkshopState) -> CoreResult<()>,
{
    let ok = match update_fn(state) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Command failed: {}", e);
            state.status_message = e.to_string();
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            false
        }
    };

    state.recompute();
    notify(state, proxy);
    ok
}

/// Sends a `WorkspaceChanged` event with the current snapshot.
pub fn notify<P: EventProxy>(state: &WorkshopState, proxy: &P) {
    let view = generate_view(state);
    proxy.send_event(UserEvent::WorkspaceChanged(Box::new(view)));
}
