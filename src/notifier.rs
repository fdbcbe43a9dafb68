// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Delivery of accepted submissions to whoever handles them.
//!
//! Real email or CRM delivery lives outside this crate. [`LogNotifier`]
//! records each event as a structured log line, which is what the site runs
//! with until a delivery backend is wired in.

use crate::models::{ContactInquiry, NewsletterSubscription};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Event handed to the notifier after a request passes validation.
#[derive(Debug, Clone)]
pub enum Notification {
    Contact(ContactInquiry),
    Subscribed(NewsletterSubscription),
    Unsubscribed { email: String },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Contact(_) => "contact",
            Self::Subscribed(_) => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification, returning an opaque message id.
    async fn deliver(&self, notification: &Notification) -> Result<String, NotifierError>;
}

/// Notifier that logs events instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    delay: Duration,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before each delivery, to mimic a remote call.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<String, NotifierError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let id = Uuid::new_v4().to_string();
        match notification {
            Notification::Contact(inquiry) => info!(
                message_id = %id,
                name = %inquiry.name,
                email = %inquiry.email,
                service_type = %inquiry.service_type,
                travelers = %inquiry.travelers,
                destination = ?inquiry.destination,
                "New contact inquiry"
            ),
            Notification::Subscribed(sub) => info!(
                message_id = %id,
                email = %sub.email,
                source = ?sub.source,
                "Newsletter subscription"
            ),
            Notification::Unsubscribed { email } => {
                info!(message_id = %id, email = %email, "Newsletter unsubscription")
            }
        }
        Ok(id)
    }
}
