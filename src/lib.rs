// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Safari Intake
//!
//! Contact form and newsletter intake for the tour operator's website:
//!
//! - Per-client fixed-window rate limiting (contact: 5 per 15 min,
//!   newsletter: 10 per hour)
//! - Declarative field validation with per-field messages
//! - Normalization (trimmed strings, lower-cased emails)
//! - Newsletter subscribe, unsubscribe and status lookup
//! - Pluggable notifier and subscriber store
//! - Client-side form submission state machine

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod notifier;
pub mod processor;
pub mod store;
pub mod validator;

pub use config::Config;
pub use error::IntakeError;
pub use limiter::{RateLimitResult, RateLimiter};
pub use processor::IntakeProcessor;
pub use validator::{validate, FieldRules, Rule};
