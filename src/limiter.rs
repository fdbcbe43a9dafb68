// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the intake endpoints.
//!
//! Each client key owns one record: a counter and the instant its window
//! ends. The first request after that instant starts a fresh window with a
//! count of one. The contact and newsletter endpoints each get their own
//! limiter so their quotas never interact.

use crate::clock::{Clock, SystemClock};
use crate::config::WindowConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Key shared by every client whose identity cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the current window ends
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Per-client counter.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_reset_at: Instant,
}

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    /// Name used in logs
    name: &'static str,
    config: WindowConfig,
    clock: Arc<dyn Clock>,
    records: Arc<RwLock<HashMap<String, WindowRecord>>>,
}

impl RateLimiter {
    /// Create a limiter driven by the system clock.
    pub fn new(name: &'static str, config: WindowConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a limiter driven by the given clock.
    pub fn with_clock(name: &'static str, config: WindowConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            config,
            clock,
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    /// Check the quota for `client_key` and consume one slot if available.
    ///
    /// The whole read-modify-write happens under the write lock, so two
    /// concurrent requests can never both take the last slot.
    pub async fn check_and_consume(&self, client_key: &str) -> RateLimitResult {
        let now = self.clock.now();
        // A fresh window always admits its first request.
        let max = self.config.max_requests.max(1);
        let mut records = self.records.write().await;

        let record = records
            .entry(client_key.to_string())
            .or_insert(WindowRecord {
                count: 0,
                window_reset_at: now,
            });
        if now >= record.window_reset_at {
            *record = WindowRecord {
                count: 0,
                window_reset_at: now + self.config.window(),
            };
        }

        if record.count < max {
            record.count += 1;
            RateLimitResult::Allowed {
                remaining: max - record.count,
                reset_in: record.window_reset_at - now,
            }
        } else {
            let retry_after = record.window_reset_at - now;
            debug!(
                limiter = self.name,
                client = %client_key,
                ?retry_after,
                "Window quota exhausted"
            );
            RateLimitResult::Limited { retry_after }
        }
    }

    /// Drop records whose window has already ended.
    ///
    /// A dropped record would have been replaced on its next use anyway, so
    /// this never changes an admit/deny decision.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| now < record.window_reset_at);
        let removed = before - records.len();
        if removed > 0 {
            debug!(limiter = self.name, removed, "Swept expired rate limit records");
        }
        removed
    }

    /// Number of client keys currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.records.read().await.len()
    }
}
