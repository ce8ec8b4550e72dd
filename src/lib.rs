//! # Form Relay
//!
//! A single-endpoint HTTP relay that accepts multipart form submissions,
//! repackages them, and forwards them to a downstream webhook.
//!
//! ## Flow
//!
//! 1. `POST /request` arrives with `multipart/form-data`.
//! 2. Text fields are collapsed into one JSON object (first value per key)
//!    and sent as `formData`.
//! 3. Each file is sent as a `fileMetadata` JSON part followed by its
//!    `binaryFile` part.
//! 4. The webhook's reply is mirrored back, or a 504 is returned if it takes
//!    longer than the configured ceiling.
//!
//! ## Architecture
//!
//! - [`relay`] - Form decoding, envelope construction, webhook forwarding
//! - [`server`] - Axum router, handlers, and error responses
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use form_relay::{create_router, HttpWebhook, RelayService, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = "http://localhost:5678/webhook/forms".parse()?;
//!     let relay = RelayService::new(HttpWebhook::new(url)?);
//!     let router = create_router(relay, RouterConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{ForwardError, RelayError};
pub use relay::{
    Envelope, EnvelopePart, FieldMap, FileEntry, FileMap, FileMetadata, HttpWebhook, InboundForm,
    RelayService, Webhook, WebhookResponse,
};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
