use std::{fmt, time::SystemTime};

use thiserror::Error;

/// Saddle-cloth number of a horse, which is also the id of its cup on the board.
pub type HorseId = u16;

/// Finishing order of a race: one horse per paying position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceResult {
    pub win: HorseId,
    pub place: HorseId,
    pub show: HorseId,
}

impl fmt::Display for RaceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} / #{} / #{}", self.win, self.place, self.show)
    }
}

/// Where a committed result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrigin {
    /// Finalized by the operator of this panel.
    Local,
    /// Pushed by the device controller and revealed by the operator.
    Remote,
    /// Loaded from the device controller when the panel started.
    Server,
}

/// Result currently shown on the banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedResult {
    pub result: RaceResult,
    pub origin: ResultOrigin,
    pub committed_at: SystemTime,
}

impl CommittedResult {
    /// Stamp `result` as committed now.
    pub fn new(result: RaceResult, origin: ResultOrigin) -> Self {
        Self {
            result,
            origin,
            committed_at: SystemTime::now(),
        }
    }
}

/// A wire payload carried a horse number that cannot address a cup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed result payload (win {win}, place {place}, show {show})")]
pub struct MalformedResult {
    pub win: i64,
    pub place: i64,
    pub show: i64,
}

impl RaceResult {
    /// Build a result from untrusted integers, rejecting values outside the cup id range.
    ///
    /// Distinctness is not checked.
    pub fn from_wire(win: i64, place: i64, show: i64) -> Result<Self, MalformedResult> {
        let convert = |value: i64| HorseId::try_from(value).ok().filter(|id| *id > 0);
        match (convert(win), convert(place), convert(show)) {
            (Some(win), Some(place), Some(show)) => Ok(Self { win, place, show }),
            _ => Err(MalformedResult { win, place, show }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_must_address_a_cup() {
        assert_eq!(
            RaceResult::from_wire(7, 3, 12),
            Ok(RaceResult {
                win: 7,
                place: 3,
                show: 12
            })
        );
        assert!(RaceResult::from_wire(0, 3, 12).is_err());
        assert!(RaceResult::from_wire(7, -3, 12).is_err());
        assert!(RaceResult::from_wire(7, 3, 70_000).is_err());
    }

    #[test]
    fn duplicate_wire_values_are_kept() {
        let result = RaceResult::from_wire(4, 4, 9).unwrap();
        assert_eq!(result.win, result.place);
    }
}
