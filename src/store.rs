// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Newsletter subscriber storage.
//!
//! The processor only talks to [`SubscriberStore`]. The in-memory
//! implementation forgets everything on restart; a durable backend slots in
//! behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Subscriber store unavailable: {0}")]
    Unavailable(String),
}

/// A stored subscription, keyed by normalized email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub subscribed_at: DateTime<Utc>,
}

/// Set of subscribed emails. Callers pass normalized emails.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn contains(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a subscriber. Returns `false` if the email was already present.
    async fn add(&self, subscriber: Subscriber) -> Result<bool, StoreError>;

    /// Remove a subscriber, returning the removed entry if there was one.
    async fn remove(&self, email: &str) -> Result<Option<Subscriber>, StoreError>;

    /// All subscribers, ordered by email.
    async fn list(&self) -> Result<Vec<Subscriber>, StoreError>;
}

/// Process-lifetime subscriber set.
#[derive(Debug, Default)]
pub struct InMemorySubscriberStore {
    subscribers: RwLock<BTreeMap<String, Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn contains(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.subscribers.read().await.contains_key(email))
    }

    async fn add(&self, subscriber: Subscriber) -> Result<bool, StoreError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.contains_key(&subscriber.email) {
            return Ok(false);
        }
        subscribers.insert(subscriber.email.clone(), subscriber);
        Ok(true)
    }

    async fn remove(&self, email: &str) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.subscribers.write().await.remove(email))
    }

    async fn list(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.subscribers.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(email: &str) -> Subscriber {
        Subscriber {
            email: email.to_string(),
            source: Some("footer".to_string()),
            subscribed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_contains_remove() {
        let store = InMemorySubscriberStore::new();

        assert!(store.add(subscriber("a@example.com")).await.unwrap());
        assert!(!store.add(subscriber("a@example.com")).await.unwrap());
        assert!(store.contains("a@example.com").await.unwrap());

        let removed = store.remove("a@example.com").await.unwrap().unwrap();
        assert_eq!(removed.source.as_deref(), Some("footer"));
        assert!(store.remove("a@example.com").await.unwrap().is_none());
        assert!(!store.contains("a@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_email() {
        let store = InMemorySubscriberStore::new();
        for email in ["zuri@example.com", "baraka@example.com", "neema@example.com"] {
            store.add(subscriber(email)).await.unwrap();
        }

        let emails: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.email)
            .collect();
        assert_eq!(
            emails,
            vec!["baraka@example.com", "neema@example.com", "zuri@example.com"]
        );
    }
}
