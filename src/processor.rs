// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request lifecycle for contact and newsletter submissions.
//!
//! Every mutating request runs the same pipeline once:
//!
//! ```text
//! rate limit -> parse body -> validate -> normalize
//!   -> (newsletter) claim in store -> notifier -> receipt
//! ```
//!
//! A newsletter claim is undone when the notifier fails.
//!
//! Each step can end the request with an [`IntakeError`]. Status lookups
//! skip the limiter and the notifier.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::IntakeError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::Metrics;
use crate::models::{parse_fields, ContactInquiry, NewsletterSubscription};
use crate::notifier::{LogNotifier, Notification, Notifier};
use crate::store::{InMemorySubscriberStore, StoreError, Subscriber, SubscriberStore};
use crate::validator::{
    contact_rules, email_only_rules, newsletter_rules, validate, FieldMap, FieldRules,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const CONTACT_SUCCESS: &str =
    "Thank you for your inquiry! Our safari specialists will get back to you within 24 hours.";
pub const SUBSCRIBE_SUCCESS: &str = "Thank you for subscribing to our newsletter!";
pub const UNSUBSCRIBE_SUCCESS: &str = "You have been unsubscribed from our newsletter.";

/// Successful outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub success: bool,
    pub message: String,
    /// Id returned by the notifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Receipt {
    fn new(message: &str, id: String) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            id: Some(id),
        }
    }
}

/// Answer to a subscription status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    pub email: String,
    pub subscribed: bool,
}

/// Which endpoint a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Contact,
    Subscribe,
    Unsubscribe,
    Status,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Status => "status",
        }
    }
}

/// Orchestrates rate limiting, validation and delegation.
pub struct IntakeProcessor {
    contact_limiter: RateLimiter,
    newsletter_limiter: RateLimiter,
    store: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    metrics: Metrics,
}

impl IntakeProcessor {
    /// Build a processor with an in-memory store and a logging notifier.
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        Self {
            contact_limiter: RateLimiter::new("contact", config.rate_limit.contact),
            newsletter_limiter: RateLimiter::new("newsletter", config.rate_limit.newsletter),
            store: Arc::new(InMemorySubscriberStore::new()),
            notifier: Arc::new(LogNotifier::with_delay(config.notifier.simulated_delay())),
            notify_timeout: config.notifier.timeout(),
            metrics,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SubscriberStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Drive both limiters from `clock`. Existing limiter state is discarded.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.contact_limiter = RateLimiter::with_clock(
            self.contact_limiter.name(),
            self.contact_limiter.config(),
            clock.clone(),
        );
        self.newsletter_limiter = RateLimiter::with_clock(
            self.newsletter_limiter.name(),
            self.newsletter_limiter.config(),
            clock,
        );
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Handle a contact form submission.
    pub async fn submit_contact(&self, client: &str, body: &[u8]) -> Result<Receipt, IntakeError> {
        let result = self.contact(client, body).await;
        self.record(Endpoint::Contact, client, &result);
        result
    }

    /// Handle a newsletter signup.
    pub async fn subscribe(&self, client: &str, body: &[u8]) -> Result<Receipt, IntakeError> {
        let result = self.newsletter_subscribe(client, body).await;
        self.record(Endpoint::Subscribe, client, &result);
        result
    }

    /// Handle a newsletter removal.
    pub async fn unsubscribe(&self, client: &str, body: &[u8]) -> Result<Receipt, IntakeError> {
        let result = self.newsletter_unsubscribe(client, body).await;
        self.record(Endpoint::Unsubscribe, client, &result);
        result
    }

    /// Report whether `email` is subscribed.
    pub async fn subscription_status(
        &self,
        email: Option<&str>,
    ) -> Result<SubscriptionStatus, IntakeError> {
        let result = self.status(email).await;
        self.record(Endpoint::Status, "-", &result);
        result
    }

    /// Sweep expired records from both limiters.
    pub async fn cleanup(&self) -> usize {
        self.contact_limiter.cleanup().await + self.newsletter_limiter.cleanup().await
    }

    async fn status(&self, email: Option<&str>) -> Result<SubscriptionStatus, IntakeError> {
        let mut fields = FieldMap::new();
        if let Some(email) = email {
            fields.insert("email".to_string(), email.to_string());
        }
        let sub = NewsletterSubscription::from_fields(&checked(fields, email_only_rules())?);
        let subscribed = self.store.contains(&sub.email).await.map_err(store_failure)?;
        Ok(SubscriptionStatus {
            email: sub.email,
            subscribed,
        })
    }

    async fn contact(&self, client: &str, body: &[u8]) -> Result<Receipt, IntakeError> {
        admit(&self.contact_limiter, client).await?;
        let fields = checked(parse_fields(body)?, contact_rules())?;
        let inquiry = ContactInquiry::from_fields(&fields);

        let id = self.delegate(Notification::Contact(inquiry)).await?;
        Ok(Receipt::new(CONTACT_SUCCESS, id))
    }

    async fn newsletter_subscribe(
        &self,
        client: &str,
        body: &[u8],
    ) -> Result<Receipt, IntakeError> {
        admit(&self.newsletter_limiter, client).await?;
        let fields = checked(parse_fields(body)?, newsletter_rules())?;
        let sub = NewsletterSubscription::from_fields(&fields);

        // Claim first; a duplicate must not reach the notifier.
        let claimed = self
            .store
            .add(Subscriber {
                email: sub.email.clone(),
                source: sub.source.clone(),
                subscribed_at: Utc::now(),
            })
            .await
            .map_err(store_failure)?;
        if !claimed {
            debug!(email = %sub.email, "Already subscribed");
            return Err(IntakeError::Duplicate);
        }

        let email = sub.email.clone();
        match self.delegate(Notification::Subscribed(sub)).await {
            Ok(id) => Ok(Receipt::new(SUBSCRIBE_SUCCESS, id)),
            Err(e) => {
                self.store.remove(&email).await.map_err(store_failure)?;
                Err(e)
            }
        }
    }

    async fn newsletter_unsubscribe(
        &self,
        client: &str,
        body: &[u8],
    ) -> Result<Receipt, IntakeError> {
        admit(&self.newsletter_limiter, client).await?;
        let fields = checked(parse_fields(body)?, email_only_rules())?;
        let email = NewsletterSubscription::from_fields(&fields).email;

        let Some(removed) = self.store.remove(&email).await.map_err(store_failure)? else {
            return Err(IntakeError::NotFound);
        };

        match self.delegate(Notification::Unsubscribed { email }).await {
            Ok(id) => Ok(Receipt::new(UNSUBSCRIBE_SUCCESS, id)),
            Err(e) => {
                self.store.add(removed).await.map_err(store_failure)?;
                Err(e)
            }
        }
    }

    /// Hand a notification to the notifier, bounded by the configured timeout.
    async fn delegate(&self, notification: Notification) -> Result<String, IntakeError> {
        let kind = notification.kind();
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.notify_timeout, self.notifier.deliver(&notification)).await;
        self.metrics
            .observe_delivery(kind, started.elapsed().as_secs_f64());

        match outcome {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(e)) => {
                error!(kind, error = %e, "Notifier failed");
                Err(IntakeError::Internal(e.to_string()))
            }
            Err(_) => {
                error!(
                    kind,
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "Notifier timed out"
                );
                Err(IntakeError::Internal("notifier timed out".to_string()))
            }
        }
    }

    fn record<T>(&self, endpoint: Endpoint, client: &str, result: &Result<T, IntakeError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.metrics.record_request(endpoint.as_str(), outcome);
        match result {
            Ok(_) => info!(endpoint = endpoint.as_str(), client = %client, "Request succeeded"),
            Err(IntakeError::RateLimited { .. }) => {
                warn!(endpoint = endpoint.as_str(), client = %client, "Request rate limited")
            }
            Err(e) => info!(
                endpoint = endpoint.as_str(),
                client = %client,
                outcome,
                error = %e,
                "Request rejected"
            ),
        }
    }
}

async fn admit(limiter: &RateLimiter, client: &str) -> Result<(), IntakeError> {
    match limiter.check_and_consume(client).await {
        RateLimitResult::Allowed { remaining, .. } => {
            debug!(limiter = limiter.name(), client = %client, remaining, "Request admitted");
            Ok(())
        }
        RateLimitResult::Limited { retry_after } => Err(IntakeError::RateLimited { retry_after }),
    }
}

fn checked(fields: FieldMap, rules: &FieldRules) -> Result<FieldMap, IntakeError> {
    let errors = validate(&fields, rules);
    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(IntakeError::ValidationFailed(errors))
    }
}

fn store_failure(e: StoreError) -> IntakeError {
    error!(error = %e, "Subscriber store failed");
    IntakeError::Internal(e.to_string())
}
