//! Configuration management for Form Relay.
//!
//! Configuration is read once at startup from command-line arguments and
//! environment variables, validated, and then handed to the router as
//! immutable values. Nothing is read from the environment afterwards.
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 8080)
//! - `ALLOWED_ORIGIN` - The single origin allowed by CORS (default: http://localhost:4321)
//! - `N8N_WEBHOOK_URL` - Downstream webhook URL (required)
//! - `FORWARD_TIMEOUT_SECS` - Ceiling for the downstream call (default: 300)
//! - `MAX_BODY_SIZE` - Maximum inbound body size in bytes (default: 200 MiB)

use std::time::Duration;

use clap::Parser;
use http::HeaderValue;
use url::Url;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default origin allowed to make cross-origin requests.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:4321";

/// Default ceiling for the downstream call in seconds (5 minutes).
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 300;

/// Default inbound body limit (200 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 200 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Form Relay - forwards multipart form submissions to a webhook.
///
/// Accepts `POST /request` with a multipart body, repackages its fields and
/// files, and relays them to the configured downstream webhook.
#[derive(Parser, Debug, Clone)]
#[command(name = "form-relay")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Origin allowed to make credentialed cross-origin requests.
    #[arg(long, default_value = DEFAULT_ALLOWED_ORIGIN, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: String,

    /// Maximum size of an inbound request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE, env = "MAX_BODY_SIZE")]
    pub max_body_size: usize,

    // =========================================================================
    // Downstream Configuration
    // =========================================================================
    /// URL of the downstream webhook that receives relayed submissions.
    #[arg(long, env = "N8N_WEBHOOK_URL")]
    pub webhook_url: String,

    /// Seconds to wait for the downstream webhook before answering 504.
    #[arg(long, default_value_t = DEFAULT_FORWARD_TIMEOUT_SECS, env = "FORWARD_TIMEOUT_SECS")]
    pub forward_timeout_secs: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.parsed_webhook_url()?;

        if HeaderValue::from_str(&self.allowed_origin).is_err() {
            return Err(format!(
                "Allowed origin '{}' is not a valid header value",
                self.allowed_origin
            ));
        }

        if self.forward_timeout_secs == 0 {
            return Err("forward_timeout_secs must be greater than 0".to_string());
        }

        if self.max_body_size == 0 {
            return Err("max_body_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Parse the webhook URL, accepting only http and https.
    pub fn parsed_webhook_url(&self) -> Result<Url, String> {
        if self.webhook_url.is_empty() {
            return Err(
                "Webhook URL is required. Set --webhook-url or N8N_WEBHOOK_URL".to_string(),
            );
        }

        let url = Url::parse(&self.webhook_url)
            .map_err(|e| format!("Invalid webhook URL '{}': {}", self.webhook_url, e))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(format!(
                "Webhook URL must use http or https, got '{}'",
                other
            )),
        }
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ceiling for the downstream call.
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
