//! Error types shared by the device-controller client.

use reqwest::StatusCode;
use thiserror::Error;

use super::event_stream::LineTooLong;

/// Convenient result alias returning [`RemoteError`] failures.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures that can occur while talking to the device controller.
///
/// Transport errors, undecodable bodies and `success: false` replies are all
/// failures of the same call; callers treat them alike.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build device controller client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not the expected JSON envelope.
    #[error("failed to decode response from `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The controller answered `success: false`.
    #[error("device controller rejected `{path}`: {message}")]
    Rejected { path: String, message: String },
    /// The push channel refused the subscription.
    #[error("unexpected status {status} opening push channel `{path}`")]
    StreamStatus { path: String, status: StatusCode },
    /// The push channel broke while streaming.
    #[error("push channel `{path}` interrupted")]
    StreamInterrupted {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The push channel sent a line too long to buffer.
    #[error("push channel `{path}` sent an oversized line")]
    StreamOverflow {
        path: String,
        #[source]
        source: LineTooLong,
    },
}

impl RemoteError {
    /// Build a rejection for `path`, falling back to a generic message.
    pub fn rejected(path: impl Into<String>, message: Option<String>) -> Self {
        RemoteError::Rejected {
            path: path.into(),
            message: message.unwrap_or_else(|| "device controller reported failure".into()),
        }
    }
}
