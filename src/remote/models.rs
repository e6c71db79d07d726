//! Request and response bodies of the device-controller HTTP API.

use serde::{Deserialize, Serialize, Serializer};

use crate::state::{
    intents::{CupTarget, Rgb},
    results::{HorseId, MalformedResult, RaceResult},
};

/// Body of `POST /api/cup/lock`.
#[derive(Debug, Serialize)]
pub struct LockCupBody {
    pub cup: HorseId,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LockCupBody {
    pub fn new(cup: HorseId, color: Rgb) -> Self {
        Self {
            cup,
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

/// Body of `POST /api/cup/unlock`; `cup` is a number or `"ALL"`.
#[derive(Debug, Serialize)]
pub struct UnlockCupBody {
    pub cup: CupTarget,
}

impl Serialize for CupTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CupTarget::Cup(cup) => serializer.serialize_u16(*cup),
            CupTarget::All => serializer.serialize_str("ALL"),
        }
    }
}

/// Body of `POST /api/command`.
#[derive(Debug, Serialize)]
pub struct CommandBody<'a> {
    pub command: &'a str,
}

/// Win/place/show triple as sent and received on the wire.
///
/// Values are signed so malformed pushes can be reported instead of failing
/// deserialization with an opaque error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultsBody {
    pub win: i64,
    pub place: i64,
    pub show: i64,
}

impl From<RaceResult> for ResultsBody {
    fn from(value: RaceResult) -> Self {
        Self {
            win: value.win.into(),
            place: value.place.into(),
            show: value.show.into(),
        }
    }
}

impl TryFrom<ResultsBody> for RaceResult {
    type Error = MalformedResult;

    fn try_from(value: ResultsBody) -> Result<Self, Self::Error> {
        RaceResult::from_wire(value.win, value.place, value.show)
    }
}

/// Uniform JSON envelope returned by every controller endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub results: Option<ResultsBody>,
}

impl ApiResponse {
    /// Human readable failure reason, if the controller gave one.
    pub fn failure_message(&self) -> Option<String> {
        self.error.clone().or_else(|| self.response.clone())
    }
}
