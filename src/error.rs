use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Errors from the outbound call to the downstream webhook
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    /// Connection, protocol, or body-read failure (including connect timeouts)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The envelope could not be encoded as a request body
    #[error("Invalid envelope: {0}")]
    Envelope(String),
}

impl From<reqwest::Error> for ForwardError {
    fn from(err: reqwest::Error) -> Self {
        ForwardError::Transport(err.to_string())
    }
}

/// Errors that can occur while relaying a single request
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// The inbound body could not be decoded as multipart form data
    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    /// The inbound body exceeded the configured limit
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The webhook answered with a non-2xx status
    #[error("Webhook returned {status}")]
    Downstream { status: StatusCode, details: String },

    /// The webhook did not answer within the ceiling
    #[error("Webhook did not respond within {after:?}")]
    Timeout { after: Duration },

    /// The forward step failed (unreachable webhook, unreadable or non-JSON reply)
    #[error("Forward failed: {0}")]
    Forward(String),

    /// Anything else that went wrong while processing the form
    #[error("Internal error: {0}")]
    Internal(String),
}
