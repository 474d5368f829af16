// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP status code mapping to provider error classes.
//!
//! ACM and CloudFront report failures with an HTTP status code. Reconcilers care about
//! a handful of distinctions: a referenced resource is absent, a conditional write lost a
//! race, or something else went wrong. This module turns a status code into one of those
//! classes so the rest of the crate never compares raw numbers.
//!
//! # Usage
//!
//! ```rust
//! use certbinder::http_errors::{classify_status, ErrorClass};
//!
//! assert_eq!(classify_status(Some(404)), ErrorClass::NotFound);
//! assert_eq!(classify_status(Some(412)), ErrorClass::Conflict);
//! assert_eq!(classify_status(None), ErrorClass::Unreachable);
//! ```

use std::fmt;

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The referenced resource does not exist (HTTP 404)
    NotFound,
    /// A concurrency precondition failed (HTTP 409, 412)
    Conflict,
    /// Any other client error (HTTP 4xx). Malformed identifiers land here.
    ClientError,
    /// Throttling or a server-side failure (HTTP 429, 5xx)
    ServerError,
    /// No HTTP response was received (connection, DNS, timeout, request construction)
    Unreachable,
}

impl ErrorClass {
    /// Metric/log label for this class.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Unreachable => "unreachable",
        }
    }

    /// True for every 4xx class, which the binder reports as "not found".
    #[must_use]
    pub fn is_client_side(self) -> bool {
        matches!(self, Self::NotFound | Self::Conflict | Self::ClientError)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an optional HTTP status code to an [`ErrorClass`].
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Class |
/// |-----------|-------|
/// | 404 | `NotFound` |
/// | 409, 412 | `Conflict` |
/// | 429 | `ServerError` |
/// | other 4xx | `ClientError` |
/// | 5xx | `ServerError` |
/// | none | `Unreachable` |
/// | anything else | `ServerError` |
#[must_use]
pub fn classify_status(status: Option<u16>) -> ErrorClass {
    match status {
        None => ErrorClass::Unreachable,
        Some(404) => ErrorClass::NotFound,
        Some(409 | 412) => ErrorClass::Conflict,
        Some(429) => ErrorClass::ServerError,
        Some(code) if (400..500).contains(&code) => ErrorClass::ClientError,
        Some(_) => ErrorClass::ServerError,
    }
}

/// Render a status code for log lines and error messages.
#[must_use]
pub fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}
