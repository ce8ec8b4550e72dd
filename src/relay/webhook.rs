//! Outbound call to the downstream webhook.
//!
//! [`Webhook`] is the forwarding contract. The only inbound header that may
//! cross it is `Authorization`, passed explicitly as a parameter.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderValue, StatusCode};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use super::envelope::{Envelope, EnvelopePart};
use crate::error::ForwardError;

/// Connect timeout for the downstream webhook.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Status and raw body returned by the webhook.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Destination for relayed envelopes.
#[async_trait]
pub trait Webhook: Send + Sync + 'static {
    /// Send an envelope, attaching `authorization` verbatim when present.
    ///
    /// Dropping the returned future must abort the call.
    async fn forward(
        &self,
        envelope: Envelope,
        authorization: Option<HeaderValue>,
    ) -> Result<WebhookResponse, ForwardError>;
}

/// Webhook reached over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: reqwest::Client,
    url: Url,
}

impl HttpWebhook {
    /// Create a webhook client for `url`.
    pub fn new(url: Url) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self { client, url })
    }

    /// Create a webhook that reuses an existing client.
    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Webhook for HttpWebhook {
    async fn forward(
        &self,
        envelope: Envelope,
        authorization: Option<HeaderValue>,
    ) -> Result<WebhookResponse, ForwardError> {
        let form = multipart_form(envelope)?;

        let mut request = self.client.post(self.url.clone()).multipart(form);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            "Webhook responded"
        );

        Ok(WebhookResponse { status, body })
    }
}

/// Encode an envelope as a reqwest multipart form, keeping part order.
pub fn multipart_form(envelope: Envelope) -> Result<Form, ForwardError> {
    let mut form = Form::new();

    for part in envelope.into_parts() {
        form = match part {
            EnvelopePart::Text { name, value } => form.text(name, value),
            EnvelopePart::Binary {
                name,
                file_name,
                mime_type,
                data,
            } => {
                let len = data.len() as u64;
                let part = Part::stream_with_length(data, len)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|e| {
                        ForwardError::Envelope(format!("Invalid MIME type '{}': {}", mime_type, e))
                    })?;
                form.part(name, part)
            }
        };
    }

    Ok(form)
}
