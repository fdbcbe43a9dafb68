// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Declarative field validation for intake payloads.
//!
//! A [`FieldRules`] set maps field names to [`Rule`]s. For each declared
//! field the checks run in a fixed order and stop at the first failure:
//!
//! 1. required and blank
//! 2. shorter than `min_length`
//! 3. longer than `max_length`
//! 4. does not match `pattern`
//! 5. fails the `custom` predicate
//!
//! Checks 2-5 only apply to present values. Lengths count characters of the
//! trimmed value.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Raw or normalized form fields.
pub type FieldMap = BTreeMap<String, String>;

/// One message per invalid field. Empty means valid.
pub type FieldErrors = BTreeMap<String, String>;

/// anything@anything.anything, no whitespace.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-\(\)]+$").expect("phone pattern compiles"));

const MIN_PHONE_DIGITS: usize = 7;

/// Validation rule for a single field.
#[derive(Clone)]
pub struct Rule {
    label: &'static str,
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    custom: Option<fn(&str) -> bool>,
    message: Option<&'static str>,
}

impl Rule {
    /// New rule; `label` is the human name used in messages.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            custom: None,
            message: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.pattern = Some(re);
        self
    }

    pub fn custom(mut self, predicate: fn(&str) -> bool) -> Self {
        self.custom = Some(predicate);
        self
    }

    /// Message reported when the pattern or custom check fails.
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Run the rule against a value, returning the first failure.
    pub fn check(&self, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        let Some(value) = value else {
            return self
                .required
                .then(|| format!("{} is required", self.label));
        };

        let len = value.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Some(format!("{} must be at least {} characters", self.label, min));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Some(format!("{} must be at most {} characters", self.label, max));
            }
        }
        if let Some(re) = &self.pattern {
            if !re.is_match(value) {
                return Some(self.invalid_message());
            }
        }
        if let Some(predicate) = self.custom {
            if !predicate(value) {
                return Some(self.invalid_message());
            }
        }
        None
    }

    fn invalid_message(&self) -> String {
        self.message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} is invalid", self.label))
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Ordered set of field rules.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<(&'static str, Rule)>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rule: Rule) -> Self {
        self.rules.push((name, rule));
        self
    }
}

/// Validate `data` against `rules`.
///
/// Fields in `data` without a rule are ignored.
pub fn validate(data: &FieldMap, rules: &FieldRules) -> FieldErrors {
    let errors: FieldErrors = rules
        .rules
        .iter()
        .filter_map(|(name, rule)| {
            rule.check(data.get(*name).map(String::as_str))
                .map(|msg| (name.to_string(), msg))
        })
        .collect();

    if !errors.is_empty() {
        debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Validation failed");
    }
    errors
}

/// `true` if `s` has the basic shape of an email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// `true` if `s` looks like a phone number with at least seven digits.
pub fn is_valid_phone(s: &str) -> bool {
    PHONE_RE.is_match(s) && has_min_phone_digits(s)
}

fn has_min_phone_digits(s: &str) -> bool {
    s.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

fn email_rule() -> Rule {
    Rule::new("Email")
        .required()
        .pattern(EMAIL_RE.clone())
        .message("Please enter a valid email address")
}

/// Rules for the contact inquiry form.
pub fn contact_rules() -> &'static FieldRules {
    static RULES: Lazy<FieldRules> = Lazy::new(|| {
        FieldRules::new()
            .field("name", Rule::new("Name").required().min_length(2).max_length(100))
            .field("email", email_rule())
            .field(
                "phone",
                Rule::new("Phone")
                    .pattern(PHONE_RE.clone())
                    .custom(has_min_phone_digits)
                    .message("Please enter a valid phone number"),
            )
            .field("country", Rule::new("Country").max_length(200))
            .field("travelers", Rule::new("Number of travelers").required())
            .field("serviceType", Rule::new("Service type").required())
            .field("destination", Rule::new("Destination").max_length(200))
            .field("travelDates", Rule::new("Travel dates").max_length(200))
            .field("budget", Rule::new("Budget").max_length(200))
            .field(
                "message",
                Rule::new("Message").required().min_length(10).max_length(1000),
            )
    });
    &RULES
}

/// Rules for newsletter subscribe requests.
pub fn newsletter_rules() -> &'static FieldRules {
    static RULES: Lazy<FieldRules> = Lazy::new(|| {
        FieldRules::new()
            .field("email", email_rule())
            .field("source", Rule::new("Source").max_length(100))
    });
    &RULES
}

/// Rules for requests that only carry an email (unsubscribe, status).
pub fn email_only_rules() -> &'static FieldRules {
    static RULES: Lazy<FieldRules> = Lazy::new(|| FieldRules::new().field("email", email_rule()));
    &RULES
}
