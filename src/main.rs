//! Form Relay - forwards multipart form submissions to a webhook.
//!
//! This binary reads configuration, builds the router, and serves it.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use form_relay::{
    config::Config,
    relay::{HttpWebhook, RelayService},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let webhook_url = match config.parsed_webhook_url() {
        Ok(url) => url,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let webhook = match HttpWebhook::new(webhook_url) {
        Ok(webhook) => webhook,
        Err(e) => {
            error!("Failed to create webhook client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Webhook: {}", webhook.url());
    info!("  Allowed origin: {}", config.allowed_origin);
    info!("  Forward timeout: {}s", config.forward_timeout_secs);
    info!("  Max body size: {} bytes", config.max_body_size);

    let relay = RelayService::with_timeout(webhook, config.forward_timeout());
    let router = create_router(relay, build_router_config(&config));

    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/", addr);
    info!("  curl -F name=Alice -F photo=@photo.png http://{}/request", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "form_relay=debug,tower_http=debug"
    } else {
        "form_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    RouterConfig::new(config.allowed_origin.clone())
        .with_max_body_size(config.max_body_size)
        .with_tracing(!config.no_tracing)
}
