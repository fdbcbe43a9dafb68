// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the intake service.
//!
//! Defaults match the quotas the website has always run with: five contact
//! submissions per fifteen minutes and ten newsletter actions per hour, per
//! client.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Origins allowed to call the API from a browser
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Limits for both intake endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Contact form window (default: 5 requests per 15 minutes)
    #[serde(default = "default_contact_window")]
    pub contact: WindowConfig,

    /// Newsletter window (default: 10 requests per hour)
    #[serde(default = "default_newsletter_window")]
    pub newsletter: WindowConfig,

    /// How often expired records are swept, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// A single fixed window quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Requests admitted per window; at least 1
    pub max_requests: u32,
}

/// External notifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Upper bound on a single delivery, in milliseconds (default: 10000)
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,

    /// Artificial delay for the logging notifier, in milliseconds (default: 0)
    #[serde(default)]
    pub simulated_delay_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_contact_window() -> WindowConfig {
    WindowConfig {
        window_ms: 15 * 60_000,
        max_requests: 5,
    }
}

fn default_newsletter_window() -> WindowConfig {
    WindowConfig {
        window_ms: 60 * 60_000,
        max_requests: 10,
    }
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_notify_timeout_ms() -> u64 {
    10_000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            notifier: NotifierConfig::default(),
            metrics: MetricsConfig::default(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            contact: default_contact_window(),
            newsletter: default_newsletter_window(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_notify_timeout_ms(),
            simulated_delay_ms: 0,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl WindowConfig {
    /// Get the window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl RateLimitConfig {
    /// Get the sweep interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to the default, as does a zero quota.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let quota = |key: &str, default: u32| {
            parsed::<u32, _>(&lookup, key)
                .filter(|&n| n > 0)
                .unwrap_or(default)
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit: RateLimitConfig {
                contact: WindowConfig {
                    window_ms: parsed(&lookup, "CONTACT_WINDOW_MS")
                        .unwrap_or(defaults.rate_limit.contact.window_ms),
                    max_requests: quota(
                        "CONTACT_MAX_REQUESTS",
                        defaults.rate_limit.contact.max_requests,
                    ),
                },
                newsletter: WindowConfig {
                    window_ms: parsed(&lookup, "NEWSLETTER_WINDOW_MS")
                        .unwrap_or(defaults.rate_limit.newsletter.window_ms),
                    max_requests: quota(
                        "NEWSLETTER_MAX_REQUESTS",
                        defaults.rate_limit.newsletter.max_requests,
                    ),
                },
                cleanup_interval_secs: parsed(&lookup, "CLEANUP_INTERVAL_SECS")
                    .unwrap_or(defaults.rate_limit.cleanup_interval_secs),
            },
            notifier: NotifierConfig {
                timeout_ms: parsed(&lookup, "NOTIFY_TIMEOUT_MS")
                    .unwrap_or(defaults.notifier.timeout_ms),
                simulated_delay_ms: parsed(&lookup, "NOTIFY_DELAY_MS")
                    .unwrap_or(defaults.notifier.simulated_delay_ms),
            },
            metrics: MetricsConfig {
                enabled: parsed(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

/// Look up `key` and parse it, ignoring surrounding whitespace.
fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
