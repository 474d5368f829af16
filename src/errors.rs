// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for provider calls, reconciliation and callback delivery.
//!
//! This module provides specialized error types for:
//! - Certificate authority and CDN API failures ([`ProviderError`])
//! - Reconciler outcomes that must be reported as `FAILED` ([`ReconcileError`])
//! - Delivering the response envelope to the orchestrator ([`CallbackError`])
//!
//! A [`ReconcileError`] is never lost: the dispatch wrapper turns every variant into a
//! failed [`ReconcileResult`] so the orchestrator always receives an answer.

use crate::constants::PHYSICAL_ID_COULD_NOT_CREATE;
use crate::http_errors::{classify_status, status_label, ErrorClass};
use crate::request::{ReconcileResult, ResourceRequest};
use crate::status_reasons::{
    REASON_BINDING_CONFLICT, REASON_BINDING_NO_VIEWER_CERTIFICATE, REASON_UNHANDLED_EXCEPTION,
};
use thiserror::Error;

/// A failed call to the certificate authority or the CDN API.
///
/// Carries the HTTP status code when the provider answered, so callers can classify the
/// failure with [`ProviderError::class`] instead of parsing messages.
#[derive(Error, Debug, Clone)]
#[error("{operation} failed for '{resource_id}' ({}): {message}", status_label(.status))]
pub struct ProviderError {
    /// Provider operation name (e.g., `DescribeCertificate`)
    pub operation: &'static str,
    /// Identifier the operation targeted (ARN, distribution id, domain)
    pub resource_id: String,
    /// HTTP status code, if a response was received
    pub status: Option<u16>,
    /// Provider error message
    pub message: String,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(
        operation: &'static str,
        resource_id: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            resource_id: resource_id.into(),
            status,
            message: message.into(),
        }
    }

    /// Classify this failure by its HTTP status code.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        classify_status(self.status)
    }
}

/// Reasons a reconciler could not converge.
///
/// Each variant maps to a `FAILED` result via [`ReconcileError::into_result`]. Variants
/// that mean "no real resource exists" report the `could-not-create` sentinel as the
/// physical id; the rest keep the prior physical id so the orchestrator does not mistake
/// a failed update for a replacement.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A declared property is missing or malformed. Never retried.
    #[error("{0}")]
    Validation(String),

    /// A referenced remote resource does not exist (4xx from an existence probe).
    #[error("{reason}: {source}")]
    NotFound {
        /// Reason reported to the orchestrator
        reason: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// An existence probe failed for a reason other than a 4xx.
    #[error("{reason}: {source}")]
    ProbeFailed {
        /// Reason reported to the orchestrator
        reason: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// The distribution has no viewer certificate block to swap.
    #[error("distribution '{distribution_id}' has no viewer certificate configuration")]
    MissingViewerCertificate {
        /// Distribution that was inspected
        distribution_id: String,
    },

    /// The etag presented with a configuration update was stale.
    #[error("distribution '{distribution_id}' changed since it was read: {source}")]
    Conflict {
        /// Distribution that was being updated
        distribution_id: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// Any other provider failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// An unexpected local failure. Reported with a generic reason.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReconcileError {
    /// Short label for metrics and structured logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::ProbeFailed { .. } => "probe_failed",
            Self::MissingViewerCertificate { .. } => "missing_viewer_certificate",
            Self::Conflict { .. } => "conflict",
            Self::Provider(_) => "provider",
            Self::Internal(_) => "internal",
        }
    }

    /// Underlying provider failure, if this error came from a provider call.
    #[must_use]
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::NotFound { source, .. }
            | Self::ProbeFailed { source, .. }
            | Self::Conflict { source, .. }
            | Self::Provider(source) => Some(source),
            Self::Validation(_) | Self::MissingViewerCertificate { .. } | Self::Internal(_) => None,
        }
    }

    /// Convert this error into the `FAILED` result reported to the orchestrator.
    #[must_use]
    pub fn into_result(self, request: &ResourceRequest) -> ReconcileResult {
        match self {
            Self::Validation(reason) => {
                ReconcileResult::failed(reason, PHYSICAL_ID_COULD_NOT_CREATE)
            }
            Self::NotFound { reason, .. } | Self::ProbeFailed { reason, .. } => {
                ReconcileResult::failed(reason, PHYSICAL_ID_COULD_NOT_CREATE)
            }
            Self::MissingViewerCertificate { .. } => ReconcileResult::failed(
                REASON_BINDING_NO_VIEWER_CERTIFICATE,
                request.physical_id_or_sentinel(),
            ),
            Self::Conflict { source, .. } => ReconcileResult::failed(
                format!("{REASON_BINDING_CONFLICT}: {source}"),
                request.physical_id_or_sentinel(),
            ),
            Self::Provider(source) => {
                ReconcileResult::failed(source.to_string(), request.physical_id_or_sentinel())
            }
            Self::Internal(_) => ReconcileResult::failed(
                REASON_UNHANDLED_EXCEPTION,
                request.physical_id_or_sentinel(),
            ),
        }
    }
}

/// Failures while delivering the response envelope to the orchestrator.
///
/// These are logged by the dispatch wrapper and never retried: the orchestrator polls
/// this very callback, so there is nobody else to tell.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// The response URL could not be parsed.
    #[error("invalid response URL '{url}': {source}")]
    InvalidUrl {
        /// URL supplied by the orchestrator
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// The envelope could not be serialized.
    #[error("failed to serialize response envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request never received an HTTP response.
    #[error("failed to reach {url}: {source}")]
    Transport {
        /// Target URL
        url: String,
        /// Transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The callback endpoint answered with a non-success status.
    #[error("callback to {url} failed with status {status}: {body}")]
    Rejected {
        /// Target URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: String,
    },
}
