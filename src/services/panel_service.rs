use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        panel::PanelSnapshot,
        results::{CommittedResultDto, PendingResultDto},
        validation::validate_animation_name,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        PanelSession, SharedState,
        intents::{FollowUp, Intent},
        results::{RaceResult, ResultOrigin},
        selection::{SelectionError, SelectionMachine},
    },
};

/// Current panel state as seen by the view.
pub async fn snapshot(state: &SharedState) -> PanelSnapshot {
    let session = state.session().lock().await;
    snapshot_of(state, &session)
}

/// Enter the selection workflow: clear the board and play the selection animation.
pub async fn start(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    let animation = state.config().selection_animation.clone();
    run_selection(state, "start", |machine| {
        let mut intents = machine.start();
        intents.push(Intent::animation(animation));
        Ok(intents)
    })
    .await
}

/// Assign `horse` to the current step and lock its cup.
pub async fn select(state: &SharedState, horse: u16) -> Result<PanelSnapshot, ServiceError> {
    run_selection(state, "select", |machine| machine.select(horse)).await
}

/// Parse a horse number as typed in a request path, then [`select`] it.
///
/// Input that is not a number in `u16` range is refused like any other
/// out-of-range horse.
pub async fn select_input(state: &SharedState, input: &str) -> Result<PanelSnapshot, ServiceError> {
    match input.trim().parse::<u16>() {
        Ok(horse) => select(state, horse).await,
        Err(_) => {
            let err = SelectionError::InvalidHorse {
                input: input.to_string(),
                max: state.config().rules.max_horse,
            };
            Err(refuse(state, "select", err))
        }
    }
}

/// Undo the previous step and unlock the cleared cup.
pub async fn go_back(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    run_selection(state, "go_back", SelectionMachine::go_back).await
}

/// Discard every selection and clear the board.
pub async fn reset(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    run_selection(state, "reset", |machine| Ok(machine.reset())).await
}

/// Confirm the selection, save it on the backend and show it on the banner.
///
/// The session is not locked while the result is saved; readers and pushed
/// results go through. On failure the selection is kept so the operator can
/// retry.
pub async fn finalize(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    let _operator = state.operator().lock().await;

    let session = state.session().lock().await;
    let planned = session.selection.version();
    let result = match session.selection.confirm() {
        Ok(result) => result,
        Err(err) => {
            drop(session);
            return Err(refuse(state, "finalize", err));
        }
    };
    drop(session);

    // the board shows the full selection before the result is saved
    state.intents().flush().await;
    info!(%result, "saving race results");
    if let Err(err) = state.device().commit_results(result).await {
        warn!(%result, error = %err, "failed to save race results");
        state
            .notifier()
            .error(format!("Failed to save results: {err}"));
        return Err(err.into());
    }

    let mut session = state.session().lock().await;
    let current = session.selection.version();
    if current != planned {
        drop(session);
        let err = SelectionError::Stale {
            expected: planned,
            actual: current,
        };
        return Err(refuse(state, "finalize", err));
    }

    let committed = session.reveal.commit(result, ResultOrigin::Local);
    let mut intents = session.selection.reset();
    intents.push(finish_animation(state));
    state.intents().submit(intents);

    let snapshot = snapshot_of(state, &session);
    drop(session);

    sse_events::broadcast_results_committed(state.events(), &CommittedResultDto::from(&committed));
    sse_events::broadcast_panel_state(state.events(), &snapshot);
    state
        .notifier()
        .success(format!("Results finalized: {result}"));
    Ok(snapshot)
}

/// Commit the pending pushed result and reset the selection.
pub async fn reveal(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    let _operator = state.operator().lock().await;
    let mut session = state.session().lock().await;
    let committed = match session.reveal.reveal() {
        Ok(committed) => committed,
        Err(err) => {
            drop(session);
            return Err(refuse(state, "reveal", err));
        }
    };

    let mut intents = session.selection.reset();
    intents.push(finish_animation(state));
    state.intents().submit(intents);

    let snapshot = snapshot_of(state, &session);
    drop(session);

    info!(result = %committed.result, "pushed results revealed");
    sse_events::broadcast_results_committed(state.events(), &CommittedResultDto::from(&committed));
    sse_events::broadcast_panel_state(state.events(), &snapshot);
    Ok(snapshot)
}

/// Drop the pending pushed result without committing it.
pub async fn dismiss(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    let _operator = state.operator().lock().await;
    let mut session = state.session().lock().await;
    let dismissed = match session.reveal.dismiss() {
        Ok(pending) => pending,
        Err(err) => {
            drop(session);
            return Err(refuse(state, "dismiss", err));
        }
    };

    let snapshot = snapshot_of(state, &session);
    drop(session);

    info!(result = %dismissed.result, "pushed results dismissed");
    sse_events::broadcast_panel_state(state.events(), &snapshot);
    Ok(snapshot)
}

/// Stage a result received on the push channel. The selection is not touched.
pub async fn stage_pushed_result(state: &SharedState, result: RaceResult) {
    let mut session = state.session().lock().await;
    if let Some(previous) = session.reveal.stage(result) {
        debug!(previous = %previous.result, latest = %result, "newer push supersedes pending result");
    }
    let pending = session.reveal.pending().map(PendingResultDto::from);
    let snapshot = snapshot_of(state, &session);
    drop(session);

    info!(%result, "results pushed; waiting for reveal");
    if let Some(pending) = pending {
        sse_events::broadcast_results_pending(state.events(), &pending);
    }
    sse_events::broadcast_panel_state(state.events(), &snapshot);
    state
        .notifier()
        .info(format!("New results received: {result}"));
}

/// Seed the banner with the result already saved on the backend.
///
/// Ignored when a result has been committed in the meantime.
pub async fn load_committed(state: &SharedState, result: RaceResult) {
    let mut session = state.session().lock().await;
    let Some(committed) = session.reveal.initialise(result) else {
        debug!(%result, "banner already set; ignoring stored results");
        return;
    };
    let snapshot = snapshot_of(state, &session);
    drop(session);

    info!(%result, "loaded stored results");
    sse_events::broadcast_results_committed(state.events(), &CommittedResultDto::from(&committed));
    sse_events::broadcast_panel_state(state.events(), &snapshot);
}

/// Committed result currently shown on the banner.
pub async fn committed(state: &SharedState) -> Option<CommittedResultDto> {
    let session = state.session().lock().await;
    session.reveal.committed().map(CommittedResultDto::from)
}

/// Clear the results on the backend, then the banner.
pub async fn clear_results(state: &SharedState) -> Result<PanelSnapshot, ServiceError> {
    let _operator = state.operator().lock().await;
    if let Err(err) = state.device().clear_results().await {
        warn!(error = %err, "failed to clear race results");
        state
            .notifier()
            .error(format!("Failed to clear results: {err}"));
        return Err(err.into());
    }

    let mut session = state.session().lock().await;
    let cleared = session.reveal.clear_committed();
    let snapshot = snapshot_of(state, &session);
    drop(session);

    info!(had_results = cleared.is_some(), "race results cleared");
    sse_events::broadcast_results_cleared(state.events());
    sse_events::broadcast_panel_state(state.events(), &snapshot);
    state.notifier().success("Results cleared");
    Ok(snapshot)
}

/// Start an animation by hand, replacing any pending follow-up.
///
/// The animation goes through the intent queue, after every board update
/// queued before it.
pub async fn trigger_animation(
    state: &SharedState,
    name: &str,
    params: Option<Value>,
) -> Result<(), ServiceError> {
    validate_animation_name(name).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| err.code.into_owned()),
        )
    })?;

    let intent = Intent::Animation {
        name: name.to_string(),
        params,
        follow_up: None,
    };
    let Some(outcome) = state.intents().execute(intent).await else {
        return Err(ServiceError::InvalidState("board dispatch has stopped".into()));
    };
    if let Err(err) = outcome {
        warn!(animation = name, error = %err, "manual animation failed");
        state
            .notifier()
            .error(format!("Failed to start animation `{name}`: {err}"));
        return Err(err.into());
    }
    Ok(())
}

/// Forward a raw command to the device controller and return its reply.
pub async fn send_command(
    state: &SharedState,
    command: &str,
) -> Result<Option<String>, ServiceError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(ServiceError::InvalidInput("command must not be blank".into()));
    }

    match state.device().send_command(command.to_string()).await {
        Ok(reply) => {
            info!(command, reply = ?reply, "device command sent");
            Ok(reply)
        }
        Err(err) => {
            warn!(command, error = %err, "device command failed");
            state
                .notifier()
                .error(format!("Command `{command}` failed: {err}"));
            Err(err.into())
        }
    }
}

/// Apply a selection operation, queue its intents and broadcast the new state.
async fn run_selection<F>(
    state: &SharedState,
    action: &'static str,
    operation: F,
) -> Result<PanelSnapshot, ServiceError>
where
    F: FnOnce(&mut SelectionMachine) -> Result<Vec<Intent>, SelectionError>,
{
    let _operator = state.operator().lock().await;
    let mut session = state.session().lock().await;
    match operation(&mut session.selection) {
        Ok(intents) => {
            debug!(action, intents = intents.len(), "selection transition applied");
            // queued under the session lock so batches keep transition order
            state.intents().submit(intents);
            let snapshot = snapshot_of(state, &session);
            drop(session);
            sse_events::broadcast_panel_state(state.events(), &snapshot);
            Ok(snapshot)
        }
        Err(err) => {
            drop(session);
            Err(refuse(state, action, err))
        }
    }
}

fn snapshot_of(state: &SharedState, session: &PanelSession) -> PanelSnapshot {
    PanelSnapshot::from_session(session, state.is_push_connected())
}

/// Report a refused operator action and convert the error.
fn refuse<E>(state: &SharedState, action: &'static str, err: E) -> ServiceError
where
    E: Into<ServiceError> + fmt::Display,
{
    info!(action, reason = %err, "operator action refused");
    state.notifier().warning(err.to_string());
    err.into()
}

fn finish_animation(state: &SharedState) -> Intent {
    let config = state.config();
    Intent::timed_animation(
        config.finish_animation.clone(),
        FollowUp {
            animation: config.idle_animation.clone(),
            delay: config.finish_follow_up,
        },
    )
}
