use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::results::{CommittedResultDto, PendingResultDto},
    state::{
        PanelSession,
        selection::{Position, SelectionMachine},
    },
};

/// Step exposed to the view.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleStep {
    /// Choosing the winner.
    Win,
    /// Choosing the second place.
    Place,
    /// Choosing the third place.
    Show,
    /// All three chosen; finalize is available.
    ReadyToConfirm,
}

/// Selection workflow state as rendered by the view.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub step: VisibleStep,
    /// Prompt for the operator.
    pub label: String,
    pub win: Option<u16>,
    pub place: Option<u16>,
    pub show: Option<u16>,
    pub ready_to_confirm: bool,
    /// Highest selectable horse number.
    pub max_horse: u16,
    /// Increments on every applied transition; lets the view drop stale snapshots.
    pub version: u64,
}

impl From<&SelectionMachine> for SelectionSnapshot {
    fn from(machine: &SelectionMachine) -> Self {
        let state = machine.state();
        let ready = state.is_ready_to_confirm();
        let (step, label) = if ready {
            (
                VisibleStep::ReadyToConfirm,
                "RESULTS COMPLETE - READY TO FINALIZE",
            )
        } else {
            let step = match state.step {
                Position::Win => VisibleStep::Win,
                Position::Place => VisibleStep::Place,
                Position::Show => VisibleStep::Show,
            };
            (step, state.step.prompt())
        };

        Self {
            step,
            label: label.to_string(),
            win: state.selection.win,
            place: state.selection.place,
            show: state.selection.show,
            ready_to_confirm: ready,
            max_horse: machine.rules().max_horse,
            version: machine.version(),
        }
    }
}

/// Whole panel state: selection, reveal prompt and banner.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PanelSnapshot {
    pub selection: SelectionSnapshot,
    /// Pushed result waiting to be revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingResultDto>,
    /// Result shown on the banner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<CommittedResultDto>,
    /// True while the results push channel is connected.
    pub push_connected: bool,
}

impl PanelSnapshot {
    /// Project the session for the view.
    pub fn from_session(session: &PanelSession, push_connected: bool) -> Self {
        Self {
            selection: SelectionSnapshot::from(&session.selection),
            pending: session.reveal.pending().map(PendingResultDto::from),
            committed: session.reveal.committed().map(CommittedResultDto::from),
            push_connected,
        }
    }
}
