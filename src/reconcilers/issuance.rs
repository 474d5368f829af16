// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Waiting for certificate issuance.
//!
//! ACM validates and issues certificates asynchronously. When a resource declares
//! `Await`, the certificate reconciler checks the authority's issued list until the
//! certificate shows up, bounded by the invocation deadline.
//!
//! The invocation environment kills in-flight work at its deadline without giving it a
//! chance to answer, so polling stops while at least [`IssuancePolicy::safety_margin`]
//! remains. Every poll therefore happens with the margin still available.
//!
//! With [`AwaitStrategy::Defer`] the reconciler checks once without sleeping and reports
//! the certificate as pending; a later Update observes completion.

use crate::constants::{
    ISSUANCE_POLL_INTERVAL_SECS, ISSUANCE_SAFETY_MARGIN_SECS, MIN_POLL_INTERVAL_SECS,
};
use crate::providers::CertificateAuthority;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How to wait for issuance when a resource declares `Await`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AwaitStrategy {
    /// Poll inside the invocation until issued or the deadline margin is reached
    #[default]
    Block,
    /// Check once and report pending immediately
    Defer,
}

/// Poll timing for issuance checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuancePolicy {
    /// Sleep between checks
    pub poll_interval: Duration,
    /// Time kept in reserve before the deadline
    pub safety_margin: Duration,
    /// Blocking or deferred waiting
    pub strategy: AwaitStrategy,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(ISSUANCE_POLL_INTERVAL_SECS),
            safety_margin: Duration::from_secs(ISSUANCE_SAFETY_MARGIN_SECS),
            strategy: AwaitStrategy::Block,
        }
    }
}

/// Terminal state of an issuance wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceState {
    /// The certificate appears in the issued list
    Issued {
        /// ARN of the issued certificate
        arn: String,
    },
    /// Not issued yet; a later reconciliation will observe completion
    Pending,
}

/// Check the issued list once for `domain`.
///
/// When `arn` is given only that certificate counts, so an older certificate for the
/// same domain is not mistaken for the one just requested. List failures are logged and
/// treated as "not yet issued".
pub async fn find_issued<A>(authority: &A, domain: &str, arn: Option<&str>) -> Option<String>
where
    A: CertificateAuthority + ?Sized,
{
    match authority.list_issued_certificates().await {
        Ok(summaries) => summaries
            .into_iter()
            .find(|summary| {
                summary.domain_name == domain && arn.is_none_or(|arn| summary.arn == arn)
            })
            .map(|summary| summary.arn),
        Err(e) => {
            warn!(domain = domain, error = %e, "Failed to list issued certificates");
            None
        }
    }
}

/// Wait for the certificate for `domain` to be issued.
///
/// With [`AwaitStrategy::Block`] this sleeps `poll_interval` between checks and stops
/// once another sleep would leave less than `safety_margin` before `deadline`. Running out
/// of time is not an error: the result is [`IssuanceState::Pending`].
pub async fn await_issuance<A>(
    authority: &A,
    domain: &str,
    arn: Option<&str>,
    deadline: Instant,
    policy: &IssuancePolicy,
) -> IssuanceState
where
    A: CertificateAuthority + ?Sized,
{
    if policy.strategy == AwaitStrategy::Defer {
        return match find_issued(authority, domain, arn).await {
            Some(arn) => IssuanceState::Issued { arn },
            None => {
                info!(domain = domain, "Deferring wait for certificate issuance");
                IssuanceState::Pending
            }
        };
    }

    let interval = policy
        .poll_interval
        .max(Duration::from_secs(MIN_POLL_INTERVAL_SECS));
    let mut attempt: u32 = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining < policy.safety_margin.saturating_add(interval) {
            warn!(
                domain = domain,
                attempt = attempt,
                remaining = ?remaining,
                "Timed out waiting for certificate issuance"
            );
            return IssuanceState::Pending;
        }

        tokio::time::sleep(interval).await;
        attempt += 1;

        if let Some(arn) = find_issued(authority, domain, arn).await {
            info!(
                domain = domain,
                arn = %arn,
                attempt = attempt,
                "Certificate has been issued"
            );
            return IssuanceState::Issued { arn };
        }

        debug!(domain = domain, attempt = attempt, "Awaiting certificate issuance");
    }
}
