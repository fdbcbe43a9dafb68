// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy surfaced by the intake endpoints.

use crate::validator::FieldErrors;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why an intake request did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Validation failed")]
    ValidationFailed(FieldErrors),

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: Duration },

    #[error("Email is already subscribed")]
    Duplicate,

    #[error("Email not found in subscriber list")]
    NotFound,

    #[error("Invalid request body: {0}")]
    Malformed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Message returned for internal failures; the cause is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_) | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Duplicate => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "invalid",
            Self::RateLimited { .. } => "rate_limited",
            Self::Duplicate => "duplicate",
            Self::NotFound => "not_found",
            Self::Malformed(_) => "malformed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Malformed(_) => "Invalid request body".to_string(),
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            details: match &self {
                Self::ValidationFailed(fields) => Some(fields.clone()),
                _ => None,
            },
        };

        match self {
            Self::RateLimited { retry_after } => {
                // Round up so clients never retry a moment too early.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (status, [(header::RETRY_AFTER, secs.to_string())], Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}
