//! HTTP server layer for Form Relay.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                 POST /request      GET /                        │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (relay, errors, panics)  │  │ (CORS, limits, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    fallback_handler, liveness_handler, panic_response, relay_handler, AppState, ErrorResponse,
    LIVENESS_MESSAGE, TIMEOUT_MESSAGE,
};
pub use routes::{create_router, RouterConfig};
