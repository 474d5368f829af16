// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider contracts for the certificate authority and the CDN configuration API.
//!
//! Reconcilers never talk to AWS directly. They receive an implementation of
//! [`CertificateAuthority`] and [`DistributionApi`] at construction time, which lets tests
//! swap in in-memory fakes and lets the binary wire the AWS SDK adapters in
//! [`acm`] and [`cloudfront`].
//!
//! # Distribution configuration
//!
//! A distribution configuration is an opaque structured document. The binder only needs to
//! read and replace its viewer certificate block, so [`DistributionApi::Config`] is any type
//! implementing [`ViewerCertificateConfig`]. The CloudFront adapter uses the SDK's typed
//! configuration; `serde_json::Value` is supported for JSON-shaped configurations.

pub mod acm;
pub mod cloudfront;

#[cfg(test)]
mod mod_tests;

use crate::constants::{
    CERTIFICATE_SOURCE_ACM, CERTIFICATE_SOURCE_CLOUDFRONT, CERTIFICATE_SOURCE_IAM,
    MINIMUM_PROTOCOL_VERSION, SSL_SUPPORT_METHOD_SNI_ONLY,
};
use crate::errors::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Lifecycle status of a certificate as reported by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateStatus {
    PendingValidation,
    Issued,
    Inactive,
    Expired,
    ValidationTimedOut,
    Revoked,
    Failed,
    Other(String),
}

impl CertificateStatus {
    /// Parse the authority's wire value (e.g., `PENDING_VALIDATION`).
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "PENDING_VALIDATION" => Self::PendingValidation,
            "ISSUED" => Self::Issued,
            "INACTIVE" => Self::Inactive,
            "EXPIRED" => Self::Expired,
            "VALIDATION_TIMED_OUT" => Self::ValidationTimedOut,
            "REVOKED" => Self::Revoked,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Authoritative remote view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Certificate ARN; doubles as the physical id
    pub arn: String,
    /// Current lifecycle status
    pub status: CertificateStatus,
    /// Primary domain plus every subject alternative name
    pub domains: BTreeSet<String>,
}

/// One entry of the issued certificate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Primary domain of the certificate
    pub domain_name: String,
    /// Certificate ARN
    pub arn: String,
}

/// Validation domain override for one domain of a certificate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DomainValidationOption {
    /// Domain being validated
    pub domain_name: String,
    /// Domain the validation email is sent to
    pub validation_domain: String,
}

/// Parameters of a request-certificate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Primary domain
    pub domain_name: String,
    /// Alternative names; omitted from the call when empty
    pub subject_alternative_names: Vec<String>,
    /// Deduplicates retried requests for the same logical resource
    pub idempotency_token: String,
    /// Validation domain overrides; omitted from the call when empty
    pub validation_options: Vec<DomainValidationOption>,
}

/// Certificate authority contract.
#[async_trait::async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Request a new certificate and return its ARN.
    async fn request_certificate(&self, request: &CertificateRequest)
        -> Result<String, ProviderError>;

    /// Fetch the status and domain set of a certificate.
    async fn describe_certificate(&self, arn: &str) -> Result<CertificateRecord, ProviderError>;

    /// Delete a certificate.
    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError>;

    /// List every certificate currently in the issued state.
    async fn list_issued_certificates(&self) -> Result<Vec<CertificateSummary>, ProviderError>;

    /// Existence probe; fails with a 4xx status for malformed or unknown ARNs.
    async fn probe_certificate(&self, arn: &str) -> Result<(), ProviderError>;
}

/// Viewer certificate block of a distribution configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerCertificate {
    /// Mechanism supplying the certificate (`acm`, `iam`, `cloudfront`)
    pub certificate_source: Option<String>,
    /// ARN or id of the certificate in use
    pub certificate: Option<String>,
    /// Minimum TLS protocol version
    pub minimum_protocol_version: Option<String>,
    /// SNI or dedicated IP delivery
    pub ssl_support_method: Option<String>,
}

impl ViewerCertificate {
    /// Viewer certificate referencing an ACM certificate with the fixed TLS policy.
    #[must_use]
    pub fn acm(certificate_arn: &str) -> Self {
        Self {
            certificate_source: Some(CERTIFICATE_SOURCE_ACM.to_string()),
            certificate: Some(certificate_arn.to_string()),
            minimum_protocol_version: Some(MINIMUM_PROTOCOL_VERSION.to_string()),
            ssl_support_method: Some(SSL_SUPPORT_METHOD_SNI_ONLY.to_string()),
        }
    }

    /// True when the certificate comes from ACM.
    #[must_use]
    pub fn is_acm(&self) -> bool {
        self.certificate_source.as_deref() == Some(CERTIFICATE_SOURCE_ACM)
    }
}

/// Read/replace access to the viewer certificate block of a distribution configuration.
pub trait ViewerCertificateConfig {
    /// Current viewer certificate block, if any.
    fn viewer_certificate(&self) -> Option<ViewerCertificate>;

    /// Replace the viewer certificate block, leaving the rest of the configuration intact.
    fn set_viewer_certificate(&mut self, certificate: &ViewerCertificate);
}

impl ViewerCertificateConfig for Value {
    fn viewer_certificate(&self) -> Option<ViewerCertificate> {
        let block = self.get("ViewerCertificate")?.as_object()?;
        let field = |name: &str| block.get(name).and_then(Value::as_str).map(str::to_string);

        let certificate_source = if field("ACMCertificateArn").is_some() {
            Some(CERTIFICATE_SOURCE_ACM.to_string())
        } else if field("IAMCertificateId").is_some() {
            Some(CERTIFICATE_SOURCE_IAM.to_string())
        } else if block.get("CloudFrontDefaultCertificate") == Some(&Value::Bool(true)) {
            Some(CERTIFICATE_SOURCE_CLOUDFRONT.to_string())
        } else {
            field("CertificateSource")
        };

        Some(ViewerCertificate {
            certificate_source,
            certificate: field("ACMCertificateArn")
                .or_else(|| field("IAMCertificateId"))
                .or_else(|| field("Certificate")),
            minimum_protocol_version: field("MinimumProtocolVersion"),
            ssl_support_method: field("SSLSupportMethod"),
        })
    }

    fn set_viewer_certificate(&mut self, certificate: &ViewerCertificate) {
        if !self.is_object() {
            *self = json!({});
        }
        self["ViewerCertificate"] = json!({
            "ACMCertificateArn": certificate.certificate,
            "Certificate": certificate.certificate,
            "CertificateSource": certificate.certificate_source,
            "MinimumProtocolVersion": certificate.minimum_protocol_version,
            "SSLSupportMethod": certificate.ssl_support_method,
        });
    }
}

/// Distribution configuration together with the etag it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSnapshot<C> {
    /// Full configuration document
    pub config: C,
    /// Concurrency token; must accompany the next update
    pub etag: String,
}

/// CDN configuration API contract.
#[async_trait::async_trait]
pub trait DistributionApi: Send + Sync {
    /// Configuration document type.
    type Config: ViewerCertificateConfig + Send + Sync;

    /// Existence probe for a distribution.
    async fn get_distribution(&self, id: &str) -> Result<(), ProviderError>;

    /// Read the configuration and its etag.
    async fn get_distribution_config(
        &self,
        id: &str,
    ) -> Result<DistributionSnapshot<Self::Config>, ProviderError>;

    /// Conditionally replace the configuration. Fails with a 409/412 status when `etag`
    /// is stale. Returns the new etag.
    async fn update_distribution_config(
        &self,
        id: &str,
        etag: &str,
        config: Self::Config,
    ) -> Result<String, ProviderError>;
}
