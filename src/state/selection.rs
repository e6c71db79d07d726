use thiserror::Error;

use super::{
    intents::{CupTarget, Intent, Rgb},
    results::{HorseId, RaceResult},
};

/// Paying positions, in the order the operator selects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Win,
    Place,
    Show,
}

impl Position {
    /// Every position in selection order.
    pub const ALL: [Position; 3] = [Position::Win, Position::Place, Position::Show];

    /// Position selected after this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Position::Win => Some(Position::Place),
            Position::Place => Some(Position::Show),
            Position::Show => None,
        }
    }

    /// Position selected before this one, if any.
    pub fn previous(self) -> Option<Self> {
        match self {
            Position::Win => None,
            Position::Place => Some(Position::Win),
            Position::Show => Some(Position::Place),
        }
    }

    /// Prompt shown to the operator while this position is being chosen.
    pub fn prompt(self) -> &'static str {
        match self {
            Position::Win => "SELECT WINNING HORSE",
            Position::Place => "SELECT PLACE HORSE",
            Position::Show => "SELECT SHOW HORSE",
        }
    }
}

/// Lock color per position. The three colors must be distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub win: Rgb,
    pub place: Rgb,
    pub show: Rgb,
}

impl Palette {
    /// Color used when locking a cup for `position`.
    pub fn color(&self, position: Position) -> Rgb {
        match position {
            Position::Win => self.win,
            Position::Place => self.place,
            Position::Show => self.show,
        }
    }

    /// True when every position gets its own color.
    pub fn is_distinct(&self) -> bool {
        self.win != self.place && self.win != self.show && self.place != self.show
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            win: Rgb::GOLD,
            place: Rgb::SILVER,
            show: Rgb::BRONZE,
        }
    }
}

/// Horses picked so far, one optional slot per position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub win: Option<HorseId>,
    pub place: Option<HorseId>,
    pub show: Option<HorseId>,
}

impl Selection {
    /// Horse assigned to `position`.
    pub fn get(&self, position: Position) -> Option<HorseId> {
        match position {
            Position::Win => self.win,
            Position::Place => self.place,
            Position::Show => self.show,
        }
    }

    fn slot_mut(&mut self, position: Position) -> &mut Option<HorseId> {
        match position {
            Position::Win => &mut self.win,
            Position::Place => &mut self.place,
            Position::Show => &mut self.show,
        }
    }

    /// Position already holding `horse`, if any.
    pub fn holder_of(&self, horse: HorseId) -> Option<Position> {
        Position::ALL
            .into_iter()
            .find(|position| self.get(*position) == Some(horse))
    }

    /// True when every position has a horse.
    pub fn is_complete(&self) -> bool {
        self.win.is_some() && self.place.is_some() && self.show.is_some()
    }
}

/// Current step plus the selections made so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub step: Position,
    pub selection: Selection,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            step: Position::Win,
            selection: Selection::default(),
        }
    }
}

impl SelectionState {
    /// All three positions are assigned; `Show` is terminal once filled.
    pub fn is_ready_to_confirm(&self) -> bool {
        self.selection.is_complete()
    }
}

/// Bounds and colors applied by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRules {
    /// Highest selectable horse number (inclusive).
    pub max_horse: HorseId,
    pub palette: Palette,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            max_horse: 20,
            palette: Palette::default(),
        }
    }
}

/// Operator commands accepted by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Enter the workflow from scratch.
    Start,
    /// Assign a horse to the current step.
    Select(HorseId),
    /// Undo the previous step.
    GoBack,
    /// Discard every selection.
    Reset,
}

/// Validated transition, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: SelectionState,
    pub to: SelectionState,
    /// Board side effects to dispatch once `to` is applied.
    pub intents: Vec<Intent>,
    /// Version of the machine after applying this transition.
    pub version_next: u64,
}

/// Reasons a command is refused. The machine is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Horse number outside `1..=max_horse`.
    #[error("horse #{horse} is out of range (1-{max})")]
    HorseOutOfRange { horse: HorseId, max: HorseId },
    /// Horse number that could not be read at all.
    #[error("`{input}` is not a horse number (1-{max})")]
    InvalidHorse { input: String, max: HorseId },
    /// Horse already holds another position.
    #[error("horse #{horse} already selected for {position:?}")]
    DuplicateSelection { horse: HorseId, position: Position },
    /// Going back from the first step.
    #[error("already at the first step")]
    AtInitialStep,
    /// Confirming before win, place and show are all chosen.
    #[error("win, place and show must all be selected")]
    IncompleteSelection,
    /// Transition planned against an older version of the machine.
    #[error("selection changed since the transition was planned (expected {expected}, got {actual})")]
    Stale { expected: u64, actual: u64 },
}

/// Win/place/show selection workflow.
///
/// [`SelectionMachine::plan`] is pure: it validates a command and returns the
/// next state together with the board intents it implies. Nothing changes
/// until the plan is handed back to [`SelectionMachine::apply`].
#[derive(Debug, Clone)]
pub struct SelectionMachine {
    rules: SelectionRules,
    state: SelectionState,
    version: u64,
}

impl SelectionMachine {
    /// Create a machine at the initial step with no selections.
    pub fn new(rules: SelectionRules) -> Self {
        Self {
            rules,
            state: SelectionState::default(),
            version: 0,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn rules(&self) -> &SelectionRules {
        &self.rules
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_ready_to_confirm(&self) -> bool {
        self.state.is_ready_to_confirm()
    }

    /// Validate `command` against the current state.
    pub fn plan(&self, command: SelectionCommand) -> Result<Transition, SelectionError> {
        let from = self.state;
        let (to, intents) = match command {
            SelectionCommand::Start | SelectionCommand::Reset => {
                (SelectionState::default(), vec![Intent::unlock_all()])
            }
            SelectionCommand::Select(horse) => self.plan_select(horse)?,
            SelectionCommand::GoBack => self.plan_go_back()?,
        };

        Ok(Transition {
            from,
            to,
            intents,
            version_next: self.version + 1,
        })
    }

    /// Commit a planned transition and hand back its intents for dispatch.
    pub fn apply(&mut self, transition: Transition) -> Result<Vec<Intent>, SelectionError> {
        if transition.version_next != self.version + 1 || transition.from != self.state {
            return Err(SelectionError::Stale {
                expected: transition.version_next,
                actual: self.version + 1,
            });
        }

        self.state = transition.to;
        self.version = transition.version_next;
        Ok(transition.intents)
    }

    /// Reset to the first step and release every cup.
    pub fn start(&mut self) -> Vec<Intent> {
        self.run(SelectionCommand::Start)
            .unwrap_or_else(|_| vec![Intent::unlock_all()])
    }

    /// Same as [`start`](Self::start), available from any state.
    pub fn reset(&mut self) -> Vec<Intent> {
        self.run(SelectionCommand::Reset)
            .unwrap_or_else(|_| vec![Intent::unlock_all()])
    }

    /// Assign `horse` to the current step and lock its cup.
    pub fn select(&mut self, horse: HorseId) -> Result<Vec<Intent>, SelectionError> {
        self.run(SelectionCommand::Select(horse))
    }

    /// Clear the previous step and release its cup.
    pub fn go_back(&mut self) -> Result<Vec<Intent>, SelectionError> {
        self.run(SelectionCommand::GoBack)
    }

    /// Produce the result described by the current selections.
    ///
    /// The selections are kept; callers reset once the result is persisted.
    pub fn confirm(&self) -> Result<RaceResult, SelectionError> {
        match self.state.selection {
            Selection {
                win: Some(win),
                place: Some(place),
                show: Some(show),
            } => Ok(RaceResult { win, place, show }),
            _ => Err(SelectionError::IncompleteSelection),
        }
    }

    fn run(&mut self, command: SelectionCommand) -> Result<Vec<Intent>, SelectionError> {
        let transition = self.plan(command)?;
        self.apply(transition)
    }

    fn plan_select(&self, horse: HorseId) -> Result<(SelectionState, Vec<Intent>), SelectionError> {
        let max = self.rules.max_horse;
        if horse == 0 || horse > max {
            return Err(SelectionError::HorseOutOfRange { horse, max });
        }

        if let Some(position) = self.state.selection.holder_of(horse) {
            return Err(SelectionError::DuplicateSelection { horse, position });
        }

        let step = self.state.step;
        let mut to = self.state;
        let mut intents = Vec::with_capacity(2);

        // Only a filled terminal show slot can be overwritten.
        if let Some(replaced) = to.selection.slot_mut(step).replace(horse) {
            intents.push(Intent::Unlock(CupTarget::Cup(replaced)));
        }
        intents.push(Intent::Lock {
            cup: horse,
            color: self.rules.palette.color(step),
        });

        if let Some(next) = step.next() {
            to.step = next;
        }

        Ok((to, intents))
    }

    fn plan_go_back(&self) -> Result<(SelectionState, Vec<Intent>), SelectionError> {
        let previous = self
            .state
            .step
            .previous()
            .ok_or(SelectionError::AtInitialStep)?;

        let mut to = self.state;
        to.step = previous;
        let intents = to
            .selection
            .slot_mut(previous)
            .take()
            .map(|cleared| vec![Intent::Unlock(CupTarget::Cup(cleared))])
            .unwrap_or_default();

        Ok((to, intents))
    }
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new(SelectionRules::default())
    }
}
