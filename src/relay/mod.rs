//! Relay layer.
//!
//! Turns one inbound multipart submission into one outbound webhook call:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ InboundForm
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              RelayService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   Envelope   │  │ timeout ceiling │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     Webhook trait (HttpWebhook)         │
//! └─────────────────────────────────────────┘
//! ```

mod envelope;
mod form;
mod service;
mod webhook;

pub use envelope::{
    Envelope, EnvelopePart, FileMetadata, BINARY_FILE_FIELD, DEFAULT_MIME_TYPE,
    FILE_METADATA_FIELD, FORM_DATA_FIELD,
};
pub use form::{FieldMap, FileEntry, FileMap, InboundForm};
pub use service::RelayService;
pub use webhook::{multipart_form, HttpWebhook, Webhook, WebhookResponse, CONNECT_TIMEOUT};
