use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{
        results::{CommittedResult, RaceResult, ResultOrigin},
        reveal::PendingResult,
    },
};

/// Win/place/show horse numbers.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct RaceResultDto {
    pub win: u16,
    pub place: u16,
    pub show: u16,
}

impl From<RaceResult> for RaceResultDto {
    fn from(value: RaceResult) -> Self {
        Self {
            win: value.win,
            place: value.place,
            show: value.show,
        }
    }
}

/// Where the banner result came from.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultOriginDto {
    /// Finalized on this panel.
    Local,
    /// Pushed by another client and revealed here.
    Remote,
    /// Loaded from the controller at start-up.
    Server,
}

impl From<ResultOrigin> for ResultOriginDto {
    fn from(value: ResultOrigin) -> Self {
        match value {
            ResultOrigin::Local => ResultOriginDto::Local,
            ResultOrigin::Remote => ResultOriginDto::Remote,
            ResultOrigin::Server => ResultOriginDto::Server,
        }
    }
}

/// Result currently shown on the banner.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct CommittedResultDto {
    #[serde(flatten)]
    pub result: RaceResultDto,
    pub origin: ResultOriginDto,
    /// RFC3339 timestamp of the commit.
    pub committed_at: String,
}

impl From<&CommittedResult> for CommittedResultDto {
    fn from(value: &CommittedResult) -> Self {
        Self {
            result: value.result.into(),
            origin: value.origin.into(),
            committed_at: format_system_time(value.committed_at),
        }
    }
}

/// Pushed result waiting for the operator to reveal it.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PendingResultDto {
    #[serde(flatten)]
    pub result: RaceResultDto,
    pub received_at: String,
}

impl From<&PendingResult> for PendingResultDto {
    fn from(value: &PendingResult) -> Self {
        Self {
            result: value.result.into(),
            received_at: format_system_time(value.received_at),
        }
    }
}

/// Committed result, absent when the banner is empty.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    pub results: Option<CommittedResultDto>,
}
