use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Raw command forwarded to the device controller.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CommandRequest {
    #[validate(length(min = 1, max = 128))]
    pub command: String,
}

/// Reply text of the device controller, when it sent one.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommandResponse {
    pub response: Option<String>,
}

/// Generic acknowledgement for actions without a meaningful payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
