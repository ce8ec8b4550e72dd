//! Router configuration for Form Relay.
//!
//! # Route Structure
//!
//! ```text
//! /          - Liveness check (GET)
//! /request   - Relay a multipart submission (POST)
//! *          - OPTIONS succeeds everywhere, anything else is 404
//! ```
//!
//! # Example
//!
//! ```ignore
//! use form_relay::relay::{HttpWebhook, RelayService};
//! use form_relay::server::{create_router, RouterConfig};
//!
//! let webhook = HttpWebhook::new(url)?;
//! let relay = RelayService::new(webhook);
//! let router = create_router(relay, RouterConfig::new("https://app.example.com"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::{HeaderValue, Method};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    fallback_handler, liveness_handler, options_handler, panic_response, relay_handler, AppState,
};
use crate::config::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_MAX_BODY_SIZE};
use crate::relay::{RelayService, Webhook};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The single origin allowed to make credentialed cross-origin requests
    pub allowed_origin: String,

    /// Maximum inbound body size in bytes
    pub max_body_size: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration allowing `allowed_origin`.
    ///
    /// By default the body limit is 200 MiB and tracing is enabled.
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            enable_tracing: true,
        }
    }

    /// Set the maximum inbound body size.
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGIN)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Layers, outermost first: tracing (optional), panic catch-all, CORS,
/// body limit.
pub fn create_router<W: Webhook>(relay: RelayService<W>, config: RouterConfig) -> Router {
    let app_state = AppState::with_body_limit(relay, config.max_body_size);

    let router = Router::new()
        .route("/", get(liveness_handler).options(options_handler))
        .route(
            "/request",
            post(relay_handler::<W>).options(options_handler),
        )
        .fallback(fallback_handler)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(build_cors_layer(&config))
        .layer(CatchPanicLayer::custom(panic_response));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer for the configured origin.
///
/// An origin that is not a valid header value allows no cross-origin requests.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400)); // 24 hours

    match HeaderValue::from_str(&config.allowed_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => cors,
    }
}

// =============================================================================
// Tests
// =============================================================================
