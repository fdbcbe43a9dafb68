// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tallies for flood simulation results.

use safari_intake::IntakeError;
use std::collections::HashMap;
use std::fmt;

/// Possible outcomes for a simulated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    RateLimited,
    Invalid,
    Malformed,
    Duplicate,
    NotFound,
    Internal,
}

impl<T> From<&Result<T, IntakeError>> for Outcome {
    fn from(result: &Result<T, IntakeError>) -> Self {
        match result {
            Ok(_) => Outcome::Accepted,
            Err(IntakeError::RateLimited { .. }) => Outcome::RateLimited,
            Err(IntakeError::ValidationFailed(_)) => Outcome::Invalid,
            Err(IntakeError::Malformed(_)) => Outcome::Malformed,
            Err(IntakeError::Duplicate) => Outcome::Duplicate,
            Err(IntakeError::NotFound) => Outcome::NotFound,
            Err(IntakeError::Internal(_)) => Outcome::Internal,
        }
    }
}

/// Counts outcomes overall and per client.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    outcomes: HashMap<Outcome, usize>,
    per_client: HashMap<String, HashMap<Outcome, usize>>,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, client: &str, outcome: Outcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self
            .per_client
            .entry(client.to_string())
            .or_default()
            .entry(outcome)
            .or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Requests that got past the limiter, whatever happened next.
    pub fn admitted(&self) -> usize {
        self.total() - self.count(Outcome::RateLimited)
    }

    pub fn client_count(&self, client: &str, outcome: Outcome) -> usize {
        self.per_client
            .get(client)
            .and_then(|m| m.get(&outcome))
            .copied()
            .unwrap_or(0)
    }

    pub fn clients(&self) -> impl Iterator<Item = &str> {
        self.per_client.keys().map(String::as_str)
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total={} clients={}", self.total(), self.per_client.len())?;
        let mut rows: Vec<_> = self.outcomes.iter().collect();
        rows.sort_by_key(|(outcome, _)| format!("{outcome:?}"));
        for (outcome, count) in rows {
            writeln!(f, "  {outcome:?}: {count}")?;
        }
        Ok(())
    }
}
