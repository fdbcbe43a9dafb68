// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the intake service.
//!
//! Handlers stay thin: they work out who is calling, pass the raw body to
//! the [`IntakeProcessor`] and turn its answer into a response.

use crate::config::Config;
use crate::error::IntakeError;
use crate::limiter::UNKNOWN_CLIENT;
use crate::processor::{IntakeProcessor, Receipt, SubscriptionStatus};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub processor: IntakeProcessor,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Body returned for unsupported verbs.
#[derive(Debug, Serialize)]
pub struct MethodNotAllowedResponse {
    pub error: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(contact).fallback(method_not_allowed))
        .route(
            "/newsletter",
            post(subscribe)
                .get(subscription_status)
                .delete(unsubscribe)
                .fallback(method_not_allowed),
        );

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.with_state(state)
}

/// Work out the rate limit key for a request.
///
/// Uses the first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket
/// peer. Anything else shares the [`UNKNOWN_CLIENT`] bucket.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn caller(headers: &HeaderMap, connect: Option<ConnectInfo<SocketAddr>>) -> String {
    client_key(headers, connect.map(|ConnectInfo(addr)| addr))
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "safari-intake",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /contact`
pub async fn contact(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Receipt>, IntakeError> {
    let client = caller(&headers, connect);
    debug!(client = %client, bytes = body.len(), "Contact submission");
    state.processor.submit_contact(&client, &body).await.map(Json)
}

/// `POST /newsletter`
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Receipt>, IntakeError> {
    let client = caller(&headers, connect);
    debug!(client = %client, "Newsletter subscribe");
    state.processor.subscribe(&client, &body).await.map(Json)
}

/// `DELETE /newsletter`
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Receipt>, IntakeError> {
    let client = caller(&headers, connect);
    debug!(client = %client, "Newsletter unsubscribe");
    state.processor.unsubscribe(&client, &body).await.map(Json)
}

/// `GET /newsletter?email=...`
pub async fn subscription_status(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<SubscriptionStatus>, IntakeError> {
    let email = query.as_deref().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "email")
            .map(|(_, value)| value.into_owned())
    });
    state
        .processor
        .subscription_status(email.as_deref())
        .await
        .map(Json)
}

/// Prometheus exposition endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.processor.metrics().render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fallback for verbs an intake route does not serve.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MethodNotAllowedResponse {
            error: "Method not allowed",
        }),
    )
}
