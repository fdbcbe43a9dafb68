// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for flood simulation.

use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of distinct client keys.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// A contact body that passes validation.
pub fn valid_contact(i: usize) -> Vec<u8> {
    json!({
        "name": format!("Visitor {i}"),
        "email": format!("visitor{i}@example.com"),
        "travelers": "2",
        "serviceType": "Wildlife Safari",
        "destination": "Amboseli",
        "message": "Please send a quote for a four day safari."
    })
    .to_string()
    .into_bytes()
}

/// A newsletter body for a distinct address.
pub fn newsletter_signup(i: usize) -> Vec<u8> {
    json!({ "email": format!("reader{i}@example.com"), "source": "footer" })
        .to_string()
        .into_bytes()
}

/// Bodies that must never be accepted.
pub fn generate_malformed_bodies() -> Vec<&'static [u8]> {
    vec![
        &b""[..],
        &b"   "[..],
        &b"null"[..],
        &b"[]"[..],
        &b"\"just a string\""[..],
        &b"{\"name\": [\"Jo\"]}"[..],
        &b"{\"name\": {\"first\": \"Jo\"}}"[..],
        &b"name=Jo&email=jo%40example.com"[..],
        &b"{\"name\": \"Jo\""[..],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }
}
