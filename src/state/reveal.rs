use std::time::SystemTime;

use thiserror::Error;

use super::results::{CommittedResult, RaceResult, ResultOrigin};

/// Result announced on the push channel and waiting for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResult {
    pub result: RaceResult,
    pub received_at: SystemTime,
}

/// Reveal workflow phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RevealPhase {
    /// No pushed result is waiting.
    #[default]
    Idle,
    /// A pushed result is waiting for the operator to reveal it.
    Pending(PendingResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RevealError {
    /// Reveal or dismiss requested while idle.
    #[error("no pushed result is waiting to be revealed")]
    NothingPending,
}

/// Pushed-result staging plus the committed banner.
///
/// Pushes never touch the selection workflow; they only stage a pending
/// result. The newest push always wins and older ones are dropped.
#[derive(Debug, Clone, Default)]
pub struct RevealState {
    phase: RevealPhase,
    committed: Option<CommittedResult>,
}

impl RevealState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &RevealPhase {
        &self.phase
    }

    pub fn pending(&self) -> Option<&PendingResult> {
        match &self.phase {
            RevealPhase::Pending(pending) => Some(pending),
            RevealPhase::Idle => None,
        }
    }

    pub fn committed(&self) -> Option<&CommittedResult> {
        self.committed.as_ref()
    }

    /// Stage a pushed result, returning the pending one it replaced.
    pub fn stage(&mut self, result: RaceResult) -> Option<PendingResult> {
        let pending = PendingResult {
            result,
            received_at: SystemTime::now(),
        };
        match std::mem::replace(&mut self.phase, RevealPhase::Pending(pending)) {
            RevealPhase::Pending(previous) => Some(previous),
            RevealPhase::Idle => None,
        }
    }

    /// Promote the pending result to the banner and return to idle.
    pub fn reveal(&mut self) -> Result<CommittedResult, RevealError> {
        let pending = self.take_pending()?;
        Ok(self.commit(pending.result, ResultOrigin::Remote))
    }

    /// Drop the pending result without committing it.
    pub fn dismiss(&mut self) -> Result<PendingResult, RevealError> {
        self.take_pending()
    }

    /// Replace the banner with `result`.
    pub fn commit(&mut self, result: RaceResult, origin: ResultOrigin) -> CommittedResult {
        let committed = CommittedResult::new(result, origin);
        self.committed = Some(committed.clone());
        committed
    }

    /// Seed the banner from the backend unless something was committed meanwhile.
    pub fn initialise(&mut self, result: RaceResult) -> Option<CommittedResult> {
        if self.committed.is_some() {
            return None;
        }
        Some(self.commit(result, ResultOrigin::Server))
    }

    /// Clear the banner, returning what it showed.
    pub fn clear_committed(&mut self) -> Option<CommittedResult> {
        self.committed.take()
    }

    fn take_pending(&mut self) -> Result<PendingResult, RevealError> {
        match std::mem::take(&mut self.phase) {
            RevealPhase::Pending(pending) => Ok(pending),
            RevealPhase::Idle => Err(RevealError::NothingPending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(win: u16, place: u16, show: u16) -> RaceResult {
        RaceResult { win, place, show }
    }

    #[test]
    fn push_moves_idle_to_pending() {
        let mut reveal = RevealState::new();
        assert_eq!(*reveal.phase(), RevealPhase::Idle);

        assert!(reveal.stage(result(2, 5, 9)).is_none());
        assert_eq!(reveal.pending().unwrap().result, result(2, 5, 9));
        assert!(reveal.committed().is_none());
    }

    #[test]
    fn latest_push_wins() {
        let mut reveal = RevealState::new();
        reveal.stage(result(2, 5, 9));
        let replaced = reveal.stage(result(8, 1, 4)).unwrap();

        assert_eq!(replaced.result, result(2, 5, 9));
        assert_eq!(reveal.pending().unwrap().result, result(8, 1, 4));

        let committed = reveal.reveal().unwrap();
        assert_eq!(committed.result, result(8, 1, 4));
        assert_eq!(committed.origin, ResultOrigin::Remote);
        assert_eq!(*reveal.phase(), RevealPhase::Idle);
        assert_eq!(reveal.committed(), Some(&committed));
    }

    #[test]
    fn reveal_and_dismiss_require_a_pending_result() {
        let mut reveal = RevealState::new();
        assert_eq!(reveal.reveal().unwrap_err(), RevealError::NothingPending);
        assert_eq!(reveal.dismiss().unwrap_err(), RevealError::NothingPending);
    }

    #[test]
    fn dismiss_keeps_the_banner() {
        let mut reveal = RevealState::new();
        reveal.commit(result(1, 2, 3), ResultOrigin::Local);
        reveal.stage(result(4, 5, 6));

        assert_eq!(reveal.dismiss().unwrap().result, result(4, 5, 6));
        assert_eq!(reveal.committed().unwrap().result, result(1, 2, 3));
        assert!(reveal.pending().is_none());
    }

    #[test]
    fn initialise_never_overwrites_a_newer_banner() {
        let mut reveal = RevealState::new();
        reveal.commit(result(1, 2, 3), ResultOrigin::Local);
        assert!(reveal.initialise(result(9, 8, 7)).is_none());
        assert_eq!(reveal.committed().unwrap().result, result(1, 2, 3));

        reveal.clear_committed();
        let seeded = reveal.initialise(result(9, 8, 7)).unwrap();
        assert_eq!(seeded.origin, ResultOrigin::Server);
    }
}
