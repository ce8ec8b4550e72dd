//! HTTP request handlers for the Form Relay API.
//!
//! # Endpoints
//!
//! - `POST /request` - Relay a multipart submission to the webhook
//! - `GET /` - Liveness check

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::config::DEFAULT_MAX_BODY_SIZE;
use crate::error::RelayError;
use crate::relay::{InboundForm, RelayService, Webhook};

/// Plaintext body of the liveness endpoint.
pub const LIVENESS_MESSAGE: &str = "Form relay is running";

/// Message returned to the caller when the webhook call times out.
pub const TIMEOUT_MESSAGE: &str =
    "The request took too long to process. Your data may still be processing.";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the relay service.
pub struct AppState<W: Webhook> {
    /// The relay that forwards submissions
    pub relay: Arc<RelayService<W>>,

    /// Inbound body limit, reported when a submission exceeds it
    pub body_limit: usize,
}

impl<W: Webhook> AppState<W> {
    pub fn new(relay: RelayService<W>) -> Self {
        Self::with_body_limit(relay, DEFAULT_MAX_BODY_SIZE)
    }

    pub fn with_body_limit(relay: RelayService<W>, body_limit: usize) -> Self {
        Self {
            relay: Arc::new(relay),
            body_limit,
        }
    }
}

impl<W: Webhook> Clone for AppState<W> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            body_limit: self.body_limit,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body returned for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short error summary
    pub error: String,

    /// Description of the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Raw body text from the webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(error)
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(error)
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert RelayError to HTTP response.
///
/// 5xx errors are logged at ERROR level, 4xx and mirrored webhook errors at WARN.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error_type, body) = match &self {
            RelayError::InvalidForm(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_form",
                ErrorResponse::new("Invalid form data"),
            ),

            RelayError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                ErrorResponse::with_message(
                    "Payload too large",
                    format!("Request body exceeds {} bytes", limit),
                ),
            ),

            RelayError::Downstream { status, details } => (
                *status,
                "webhook_error",
                ErrorResponse::with_details(
                    format!("N8N webhook error: {}", status.as_u16()),
                    details.clone(),
                ),
            ),

            RelayError::Timeout { .. } => (
                StatusCode::GATEWAY_TIMEOUT,
                "gateway_timeout",
                ErrorResponse::with_message("Gateway Timeout", TIMEOUT_MESSAGE),
            ),

            RelayError::Forward(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "forward_failed",
                ErrorResponse::with_message("Failed to process request", message.clone()),
            ),

            RelayError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                ErrorResponse::with_message("Failed to process form data", message.clone()),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
        }

        (status, Json(body)).into_response()
    }
}

/// Answer a panic during request processing with the catch-all body.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    RelayError::Internal(message).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle relay requests.
///
/// # Endpoint
///
/// `POST /request`
///
/// # Request
///
/// `Content-Type: multipart/form-data` with any text fields and files. An
/// `Authorization` header, if sent, is passed to the webhook unchanged.
///
/// # Response
///
/// - `200 OK`: the webhook's JSON reply
/// - `400 Bad Request`: the body is not valid multipart form data
/// - `413 Payload Too Large`: the body exceeds the configured limit
/// - `4xx/5xx`: the webhook's own error status, with its body as `details`
/// - `500 Internal Server Error`: the webhook could not be reached or processing failed
/// - `504 Gateway Timeout`: the webhook did not answer in time
pub async fn relay_handler<W: Webhook>(
    State(state): State<AppState<W>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, RelayError> {
    let multipart = multipart.map_err(|rejection| RelayError::InvalidForm(rejection.body_text()))?;
    let form = InboundForm::from_multipart(multipart, state.body_limit).await?;

    let authorization = headers.get(AUTHORIZATION).cloned();
    let reply = state.relay.relay(form, authorization).await?;

    Ok(Json(reply))
}

/// Liveness check.
///
/// # Endpoint
///
/// `GET /`
pub async fn liveness_handler() -> &'static str {
    LIVENESS_MESSAGE
}

/// Answer non-preflight `OPTIONS` requests.
pub async fn options_handler() -> StatusCode {
    StatusCode::OK
}

/// Fallback for unmatched routes. `OPTIONS` always succeeds.
pub async fn fallback_handler(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
