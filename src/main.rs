// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Safari Intake Service
//!
//! Serves the contact form and newsletter endpoints behind the website:
//!
//! - `POST /contact`
//! - `POST /newsletter`, `GET /newsletter?email=`, `DELETE /newsletter`
//! - `GET /health`, `GET /metrics`
//!
//! ## Configuration
//!
//! Read from environment variables (a `.env` file is loaded first if present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `CONTACT_WINDOW_MS` / `CONTACT_MAX_REQUESTS`: contact quota (default: 15 min / 5)
//! - `NEWSLETTER_WINDOW_MS` / `NEWSLETTER_MAX_REQUESTS`: newsletter quota (default: 60 min / 10)
//! - `NOTIFY_TIMEOUT_MS`: notifier timeout (default: 10000)
//! - `ALLOWED_ORIGINS`: comma-separated CORS origins

use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use safari_intake::{
    config::Config,
    handlers::{router, AppState},
    metrics::Metrics,
    processor::IntakeProcessor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        contact_max = config.rate_limit.contact.max_requests,
        contact_window_ms = config.rate_limit.contact.window_ms,
        newsletter_max = config.rate_limit.newsletter.max_requests,
        newsletter_window_ms = config.rate_limit.newsletter.window_ms,
        "Starting safari intake service"
    );

    let processor = IntakeProcessor::new(&config, Metrics::new()?);
    let state = Arc::new(AppState {
        processor,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_state.processor.cleanup().await;
        }
    });

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
