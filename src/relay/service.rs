//! Relay Service: envelope build, bounded forward, response translation.
//!
//! ```text
//! InboundForm ──► Envelope::from_form ──► Webhook::forward ──► translate
//!                                          (bounded by
//!                                           tokio::time::timeout)
//! ```

use std::time::Duration;

use http::HeaderValue;
use serde_json::Value;
use tracing::{debug, warn};

use super::envelope::Envelope;
use super::form::InboundForm;
use super::webhook::{Webhook, WebhookResponse};
use crate::config::DEFAULT_FORWARD_TIMEOUT_SECS;
use crate::error::{ForwardError, RelayError};

/// Relays decoded submissions to a webhook.
pub struct RelayService<W: Webhook> {
    webhook: W,
    timeout: Duration,
}

impl<W: Webhook> RelayService<W> {
    /// Create a relay with the default 5-minute ceiling.
    pub fn new(webhook: W) -> Self {
        Self::with_timeout(webhook, Duration::from_secs(DEFAULT_FORWARD_TIMEOUT_SECS))
    }

    /// Create a relay with a custom ceiling on the downstream call.
    pub fn with_timeout(webhook: W, timeout: Duration) -> Self {
        Self { webhook, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn webhook(&self) -> &W {
        &self.webhook
    }

    /// Forward a submission and return the webhook's JSON reply.
    pub async fn relay(
        &self,
        form: InboundForm,
        authorization: Option<HeaderValue>,
    ) -> Result<Value, RelayError> {
        let envelope = Envelope::from_form(form)?;

        debug!(
            files = envelope.file_count(),
            parts = envelope.parts().len(),
            authorization = authorization.is_some(),
            "Forwarding envelope to webhook"
        );

        let forward = self.webhook.forward(envelope, authorization);
        let response = match tokio::time::timeout(self.timeout, forward).await {
            Ok(result) => result.map_err(forward_error)?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Webhook call timed out");
                return Err(RelayError::Timeout {
                    after: self.timeout,
                });
            }
        };

        translate(response)
    }
}

/// Only the relay's own ceiling yields a timeout; client-level timeouts are
/// transport failures.
fn forward_error(err: ForwardError) -> RelayError {
    match err {
        ForwardError::Transport(message) => RelayError::Forward(message),
        ForwardError::Envelope(message) => RelayError::Internal(message),
    }
}

/// Map a webhook reply onto the relay's result.
fn translate(response: WebhookResponse) -> Result<Value, RelayError> {
    if !response.status.is_success() {
        let details = String::from_utf8_lossy(&response.body).into_owned();
        warn!(status = response.status.as_u16(), "Webhook returned an error");
        return Err(RelayError::Downstream {
            status: response.status,
            details,
        });
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| RelayError::Forward(format!("Webhook returned invalid JSON: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================
