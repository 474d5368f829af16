// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # certbinder - ACM certificate custom resources
//!
//! certbinder answers CloudFormation custom resource events for two resource kinds:
//!
//! - **Certificate** - requests an ACM certificate for a list of domains, replaces it when
//!   the domain set changes, and deletes it on teardown
//! - **CertificateBinding** - points a CloudFront distribution's viewer certificate at an
//!   ACM certificate
//!
//! Every event is answered exactly once by PUTting a response envelope to the event's
//! pre-signed `ResponseURL`, whatever happens during reconciliation.
//!
//! ## Modules
//!
//! - [`request`] - Event, request, result and response envelope types
//! - [`reconcilers`] - Reconciliation logic for each resource kind
//! - [`providers`] - Certificate authority and CDN contracts plus their AWS adapters
//! - [`dispatch`] - Runs a reconciler and delivers its envelope
//! - [`callback`] - HTTP delivery of response envelopes
//! - [`server`] - HTTP front end accepting events
//! - [`config`] - Command line and environment configuration
//! - [`errors`] / [`http_errors`] - Error types and status classification
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use certbinder::reconcilers::idempotency_token;
//!
//! let token = idempotency_token("arn:aws:cloudformation:us-east-1:1:stack/web/1", "Cert");
//! assert_eq!(token.len(), 30);
//! ```

pub mod callback;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod http_errors;
pub mod metrics;
pub mod providers;
pub mod reconcilers;
pub mod request;
pub mod server;
pub mod status_reasons;

#[cfg(test)]
mod config_tests;
