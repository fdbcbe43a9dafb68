// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for flood simulations against the intake processor.
//!
//! Generators build client keys and payloads; the tally records how each
//! simulated request ended.

pub mod generators;
pub mod metrics;
