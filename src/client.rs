// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client-side submission flow for the site's forms.
//!
//! A [`SubmissionForm`] holds the field values a visitor typed and moves
//! through `Idle -> Submitting -> Success | Error -> Idle`. The rendering
//! layer calls [`SubmissionForm::submit`] on the submit action and
//! [`SubmissionForm::tick`] from its timer; the form talks to the intake
//! service through an [`IntakeTransport`].

use crate::clock::{Clock, SystemClock};
use crate::validator::{FieldErrors, FieldMap};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Shown when no response came back at all.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Shown when the service answered with an error but no message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to submit. Please try again.";

/// How long a success or error message stays up before the form resets.
pub const DEFAULT_RESET_AFTER: Duration = Duration::from_secs(5);

/// Lifecycle of a single form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Success(String),
    Error(String),
}

impl FormState {
    pub fn is_settled(&self) -> bool {
        matches!(self, FormState::Success(_) | FormState::Error(_))
    }
}

/// Which intake action a form performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Subscribe,
    Unsubscribe,
}

impl FormKind {
    fn method(&self) -> Method {
        match self {
            FormKind::Contact | FormKind::Subscribe => Method::POST,
            FormKind::Unsubscribe => Method::DELETE,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            FormKind::Contact => "/contact",
            FormKind::Subscribe | FormKind::Unsubscribe => "/newsletter",
        }
    }

    /// Fields checked locally before a request is sent.
    fn default_required(&self) -> &'static [&'static str] {
        match self {
            FormKind::Contact => &["name", "email"],
            FormKind::Subscribe | FormKind::Unsubscribe => &["email"],
        }
    }
}

/// Request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeRequest {
    pub method: Method,
    pub path: &'static str,
    pub body: Value,
}

/// Status and JSON body returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeReply {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Network(e.to_string())
    }
}

/// Carries intake requests to the service.
#[async_trait]
pub trait IntakeTransport: Send + Sync {
    async fn send(&self, request: &IntakeRequest) -> Result<IntakeReply, TransportError>;
}

/// HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl IntakeTransport for HttpTransport {
    async fn send(&self, request: &IntakeRequest) -> Result<IntakeReply, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let response = self
            .client
            .request(request.method.clone(), &url)
            .json(&request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        // A non-JSON body still carries a status worth reporting.
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(IntakeReply { status, body })
    }
}

/// Why a submit action did not start a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRefused {
    #[error("A submission is already in progress")]
    InFlight,

    #[error("Please fill in all required fields")]
    MissingFields(Vec<String>),
}

/// One form instance and its submission state.
pub struct SubmissionForm<T> {
    kind: FormKind,
    transport: T,
    clock: Arc<dyn Clock>,
    state: FormState,
    fields: FieldMap,
    field_errors: FieldErrors,
    required: Vec<String>,
    reset_after: Duration,
    settled_at: Option<Instant>,
}

impl<T: IntakeTransport> SubmissionForm<T> {
    pub fn new(kind: FormKind, transport: T) -> Self {
        Self {
            kind,
            transport,
            clock: Arc::new(SystemClock),
            state: FormState::Idle,
            fields: FieldMap::new(),
            field_errors: FieldErrors::new(),
            required: kind.default_required().iter().map(|f| f.to_string()).collect(),
            reset_after: DEFAULT_RESET_AFTER,
            settled_at: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reset_after(mut self, reset_after: Duration) -> Self {
        self.reset_after = reset_after;
        self
    }

    /// Replace the locally checked required fields.
    pub fn with_required(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Per-field messages from the last rejected submission.
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Start a submission.
    ///
    /// Refused while a request is in flight, and when a required field is
    /// blank; in both cases the state is left alone.
    pub fn begin_submit(&mut self) -> Result<IntakeRequest, SubmitRefused> {
        if self.state == FormState::Submitting {
            debug!(kind = ?self.kind, "Ignoring submit while in flight");
            return Err(SubmitRefused::InFlight);
        }

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|f| self.fields.get(*f).map_or(true, |v| v.trim().is_empty()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SubmitRefused::MissingFields(missing));
        }

        let body = match self.kind {
            FormKind::Unsubscribe => {
                let mut map = Map::new();
                if let Some(email) = self.fields.get("email") {
                    map.insert("email".into(), Value::String(email.clone()));
                }
                Value::Object(map)
            }
            FormKind::Contact | FormKind::Subscribe => Value::Object(
                self.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        };

        self.state = FormState::Submitting;
        self.settled_at = None;
        self.field_errors.clear();
        Ok(IntakeRequest {
            method: self.kind.method(),
            path: self.kind.path(),
            body,
        })
    }

    /// Apply the outcome of the in-flight request. Ignored unless submitting.
    pub fn finish(&mut self, outcome: Result<IntakeReply, TransportError>) {
        if self.state != FormState::Submitting {
            return;
        }

        self.state = match outcome {
            Ok(reply) if (200..300).contains(&reply.status) => {
                self.fields.clear();
                FormState::Success(
                    reply.body["message"]
                        .as_str()
                        .unwrap_or("Submitted successfully")
                        .to_string(),
                )
            }
            Ok(reply) => {
                if let Some(details) = reply.body["details"].as_object() {
                    self.field_errors = details
                        .iter()
                        .filter_map(|(k, v)| v.as_str().map(|m| (k.clone(), m.to_string())))
                        .collect();
                }
                FormState::Error(
                    reply.body["error"]
                        .as_str()
                        .unwrap_or(FALLBACK_ERROR_MESSAGE)
                        .to_string(),
                )
            }
            Err(e) => {
                debug!(kind = ?self.kind, error = %e, "Submission transport failed");
                FormState::Error(NETWORK_ERROR_MESSAGE.to_string())
            }
        };
        self.settled_at = Some(self.clock.now());
    }

    /// Run a full submission: begin, send, finish.
    pub async fn submit(&mut self) -> Result<&FormState, SubmitRefused> {
        let request = self.begin_submit()?;
        let outcome = self.transport.send(&request).await;
        self.finish(outcome);
        Ok(&self.state)
    }

    /// Clear a success or error message.
    pub fn dismiss(&mut self) {
        if self.state.is_settled() {
            self.state = FormState::Idle;
            self.settled_at = None;
        }
    }

    /// Reset a settled form once its message has been up long enough.
    pub fn tick(&mut self) {
        if let Some(settled_at) = self.settled_at {
            if self.clock.now().duration_since(settled_at) >= self.reset_after {
                self.dismiss();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays canned outcomes and records requests.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<IntakeReply, TransportError>>>,
        sent: Mutex<Vec<IntakeRequest>>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Result<IntakeReply, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl IntakeTransport for ScriptedTransport {
        async fn send(&self, request: &IntakeRequest) -> Result<IntakeReply, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no reply scripted".into())))
        }
    }

    fn reply(status: u16, body: Value) -> Result<IntakeReply, TransportError> {
        Ok(IntakeReply { status, body })
    }

    fn filled_contact(transport: ScriptedTransport) -> SubmissionForm<ScriptedTransport> {
        let mut form = SubmissionForm::new(FormKind::Contact, transport);
        form.set_field("name", "Jo");
        form.set_field("email", "jo@example.com");
        form.set_field("message", "I would like a quote please for July.");
        form
    }

    #[tokio::test]
    async fn test_success_clears_fields() {
        let transport = ScriptedTransport::replying(vec![reply(
            200,
            json!({"success": true, "message": "Thanks!"}),
        )]);
        let mut form = filled_contact(transport);

        let state = form.submit().await.unwrap().clone();
        assert_eq!(state, FormState::Success("Thanks!".into()));
        assert!(form.fields().is_empty());

        let sent = form.transport.sent.lock().unwrap();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].path, "/contact");
        assert_eq!(sent[0].body["email"], "jo@example.com");
    }

    #[tokio::test]
    async fn test_error_reply_surfaces_service_message() {
        let transport = ScriptedTransport::replying(vec![reply(
            400,
            json!({"success": false, "error": "Validation failed",
                   "details": {"message": "Message must be at least 10 characters"}}),
        )]);
        let mut form = filled_contact(transport);

        form.submit().await.unwrap();
        assert_eq!(form.state(), &FormState::Error("Validation failed".into()));
        assert_eq!(
            form.field_errors()["message"],
            "Message must be at least 10 characters"
        );
        // Fields are kept so the visitor can correct them.
        assert_eq!(form.fields()["name"], "Jo");
    }

    #[tokio::test]
    async fn test_network_failure_uses_generic_message() {
        let mut form = filled_contact(ScriptedTransport::replying(vec![Err(
            TransportError::Network("connection reset".into()),
        )]));

        form.submit().await.unwrap();
        assert_eq!(form.state(), &FormState::Error(NETWORK_ERROR_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_error_without_message_falls_back() {
        let mut form = filled_contact(ScriptedTransport::replying(vec![reply(502, Value::Null)]));
        form.submit().await.unwrap();
        assert_eq!(form.state(), &FormState::Error(FALLBACK_ERROR_MESSAGE.into()));
    }

    #[test]
    fn test_double_submit_is_refused() {
        let mut form = filled_contact(ScriptedTransport::default());

        assert!(form.begin_submit().is_ok());
        assert_eq!(form.begin_submit(), Err(SubmitRefused::InFlight));
        assert_eq!(form.state(), &FormState::Submitting);
    }

    #[test]
    fn test_missing_required_fields_keep_idle() {
        let mut form = SubmissionForm::new(FormKind::Contact, ScriptedTransport::default());
        form.set_field("name", "  ");

        assert_eq!(
            form.begin_submit(),
            Err(SubmitRefused::MissingFields(vec!["name".into(), "email".into()]))
        );
        assert_eq!(form.state(), &FormState::Idle);
    }

    #[test]
    fn test_reply_without_submit_is_ignored() {
        let mut form = filled_contact(ScriptedTransport::default());
        form.finish(reply(200, json!({"message": "stale"})));
        assert_eq!(form.state(), &FormState::Idle);
    }

    #[tokio::test]
    async fn test_auto_reset_after_delay() {
        let clock = ManualClock::default();
        let mut form = filled_contact(ScriptedTransport::replying(vec![reply(
            200,
            json!({"message": "ok"}),
        )]))
        .with_clock(Arc::new(clock.clone()));

        form.submit().await.unwrap();
        clock.advance(Duration::from_millis(4_999));
        form.tick();
        assert!(form.state().is_settled());

        clock.advance(Duration::from_millis(1));
        form.tick();
        assert_eq!(form.state(), &FormState::Idle);
    }

    #[tokio::test]
    async fn test_resubmit_from_error() {
        let mut form = filled_contact(ScriptedTransport::replying(vec![
            reply(429, json!({"error": "Too many requests. Please try again later."})),
            reply(200, json!({"message": "ok"})),
        ]));

        form.submit().await.unwrap();
        assert!(matches!(form.state(), FormState::Error(_)));
        form.submit().await.unwrap();
        assert_eq!(form.state(), &FormState::Success("ok".into()));
    }

    #[tokio::test]
    async fn test_unsubscribe_sends_only_email() {
        let mut form = SubmissionForm::new(
            FormKind::Unsubscribe,
            ScriptedTransport::replying(vec![reply(200, json!({"message": "bye"}))]),
        );
        form.set_field("email", "a@example.com");
        form.set_field("source", "footer");

        form.submit().await.unwrap();
        let sent = form.transport.sent.lock().unwrap();
        assert_eq!(sent[0].method, Method::DELETE);
        assert_eq!(sent[0].body, json!({"email": "a@example.com"}));
    }
}
