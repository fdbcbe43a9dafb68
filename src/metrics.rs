// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the intake endpoints.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Intake metrics backed by a private registry.
///
/// Cloning is cheap; clones update the same series.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    notifier_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("intake_requests_total", "Intake requests by endpoint and outcome"),
            &["endpoint", "outcome"],
        )?;
        let notifier_duration = HistogramVec::new(
            HistogramOpts::new(
                "intake_notifier_duration_seconds",
                "Time spent delivering notifications",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(notifier_duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            notifier_duration,
        })
    }

    pub fn record_request(&self, endpoint: &str, outcome: &str) {
        self.requests.with_label_values(&[endpoint, outcome]).inc();
    }

    pub fn observe_delivery(&self, kind: &str, seconds: f64) {
        self.notifier_duration
            .with_label_values(&[kind])
            .observe(seconds);
    }

    /// Current count for one endpoint/outcome pair.
    pub fn request_count(&self, endpoint: &str, outcome: &str) -> u64 {
        self.requests.with_label_values(&[endpoint, outcome]).get()
    }

    /// Render all series in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
