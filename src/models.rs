// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Intake payloads and their normalization.

use crate::error::IntakeError;
use crate::validator::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validated, normalized contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub travelers: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_dates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    pub message: String,
}

/// A validated, normalized newsletter signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Trim and lower-case an email for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(fields: &FieldMap, key: &str) -> String {
    fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn optional(fields: &FieldMap, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ContactInquiry {
    /// Build a normalized inquiry from fields that already passed validation.
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            name: required(fields, "name"),
            email: normalize_email(&required(fields, "email")),
            phone: optional(fields, "phone"),
            country: optional(fields, "country"),
            travelers: required(fields, "travelers"),
            service_type: required(fields, "serviceType"),
            destination: optional(fields, "destination"),
            travel_dates: optional(fields, "travelDates"),
            budget: optional(fields, "budget"),
            message: required(fields, "message"),
        }
    }

    /// Flatten back into form fields.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), self.name.clone());
        fields.insert("email".into(), self.email.clone());
        fields.insert("travelers".into(), self.travelers.clone());
        fields.insert("serviceType".into(), self.service_type.clone());
        fields.insert("message".into(), self.message.clone());
        let extras = [
            ("phone", &self.phone),
            ("country", &self.country),
            ("destination", &self.destination),
            ("travelDates", &self.travel_dates),
            ("budget", &self.budget),
        ];
        for (key, value) in extras {
            if let Some(v) = value {
                fields.insert(key.into(), v.clone());
            }
        }
        fields
    }
}

impl NewsletterSubscription {
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            email: normalize_email(&required(fields, "email")),
            source: optional(fields, "source"),
        }
    }
}

/// Parse a request body into flat string fields.
///
/// The body must be a JSON object. String values are taken as-is, numbers
/// and booleans are rendered as strings and `null` counts as absent.
/// Nested arrays or objects make the whole body malformed.
pub fn parse_fields(body: &[u8]) -> Result<FieldMap, IntakeError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| IntakeError::Malformed(format!("body is not valid JSON: {e}")))?;

    let Value::Object(object) = value else {
        return Err(IntakeError::Malformed("body must be a JSON object".into()));
    };

    let mut fields = FieldMap::new();
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(IntakeError::Malformed(format!(
                    "field `{key}` must be a string"
                )))
            }
        };
        fields.insert(key, text);
    }
    Ok(fields)
}
