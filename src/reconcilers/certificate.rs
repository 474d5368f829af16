// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate reconciliation logic.
//!
//! Requests ACM certificates for a declared list of domains, replaces them when the
//! domain set changes, and deletes them on teardown.
//!
//! # Idempotency
//!
//! Every request carries an idempotency token derived from the stack id and logical
//! resource id, so a retried Create for the same resource does not create a second
//! certificate.
//!
//! # Deletion
//!
//! Delete always reports success. A custom resource that cannot be deleted blocks stack
//! teardown indefinitely, so provider errors are logged and put in the reason instead.

use super::issuance::{await_issuance, IssuancePolicy, IssuanceState};
use super::validation::{optional_flag, require_domains, validation_options};
use super::Reconciler;
use crate::constants::{
    ACM_ARN_SERVICE, IDEMPOTENCY_TOKEN_MAX_LEN, IDEMPOTENCY_TOKEN_PREFIX, PROP_AWAIT,
    RESOURCE_TYPE_CERTIFICATE,
};
use crate::errors::ReconcileError;
use crate::metrics;
use crate::providers::{
    CertificateAuthority, CertificateRequest, CertificateStatus, DomainValidationOption,
};
use crate::request::{ReconcileResult, ResourceRequest};
use crate::status_reasons::{
    REASON_CERTIFICATE_DELETED, REASON_CERTIFICATE_DELETE_FAILED, REASON_CERTIFICATE_ISSUED,
    REASON_CERTIFICATE_PENDING, REASON_CERTIFICATE_REQUESTED, REASON_CERTIFICATE_UNCHANGED,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Derive the idempotency token for a logical resource.
///
/// Lowercase hex SHA-256 of `cfn-{stack_id}-{logical_resource_id}`, truncated to the
/// authority's token length limit.
///
/// # Example
///
/// ```rust
/// use certbinder::reconcilers::idempotency_token;
///
/// let token = idempotency_token("stack-1", "SiteCertificate");
/// assert_eq!(token.len(), 30);
/// assert_eq!(token, idempotency_token("stack-1", "SiteCertificate"));
/// ```
#[must_use]
pub fn idempotency_token(stack_id: &str, logical_resource_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{IDEMPOTENCY_TOKEN_PREFIX}-{stack_id}-{logical_resource_id}"));
    let mut token = format!("{:x}", hasher.finalize());
    token.truncate(IDEMPOTENCY_TOKEN_MAX_LEN);
    token
}

/// Idempotency token for a replacement certificate.
///
/// The authority deduplicates by token for an hour, so a replacement within that window
/// would otherwise get back the certificate that was just deleted. Folding the sorted
/// domain set into the hash keeps replacements distinct while staying stable across
/// retries of the same replacement.
#[must_use]
pub fn replacement_token(
    stack_id: &str,
    logical_resource_id: &str,
    domains: &BTreeSet<String>,
) -> String {
    let joined = domains.iter().map(String::as_str).collect::<Vec<_>>().join(",");
    idempotency_token(stack_id, &format!("{logical_resource_id}-{joined}"))
}

/// True when `id` is an ACM certificate ARN in any partition.
#[must_use]
pub fn is_certificate_arn(id: &str) -> bool {
    let mut parts = id.splitn(6, ':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("arn"), Some(partition), Some(ACM_ARN_SERVICE)) if !partition.is_empty()
    ) && parts.count() == 3
}

/// Declared state of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSpec {
    /// First declared domain
    pub primary_domain: String,
    /// Remaining declared domains, in order
    pub alternative_domains: Vec<String>,
    /// Validation domain overrides
    pub validation_options: Vec<DomainValidationOption>,
    /// Wait for issuance before answering
    pub await_issuance: bool,
}

impl CertificateSpec {
    /// Parse and validate the declared properties of `request`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `Domains`, `ValidationOptions`, `ValidationDomain` or
    /// `Await` is malformed.
    pub fn from_request(request: &ResourceRequest) -> Result<Self, ReconcileError> {
        let domains = require_domains(request)?;
        let validation_options = validation_options(request, &domains)?;
        let await_issuance = optional_flag(request, PROP_AWAIT)?;

        let mut domains = domains.into_iter();
        let primary_domain = domains.next().unwrap_or_default();

        Ok(Self {
            primary_domain,
            alternative_domains: domains.collect(),
            validation_options,
            await_issuance,
        })
    }

    /// Every declared domain, order-independent.
    #[must_use]
    pub fn domain_set(&self) -> BTreeSet<String> {
        std::iter::once(&self.primary_domain)
            .chain(&self.alternative_domains)
            .cloned()
            .collect()
    }

    /// Build the request-certificate parameters for this spec.
    #[must_use]
    pub fn to_request(&self, idempotency_token: String) -> CertificateRequest {
        CertificateRequest {
            domain_name: self.primary_domain.clone(),
            subject_alternative_names: self.alternative_domains.clone(),
            idempotency_token,
            validation_options: self.validation_options.clone(),
        }
    }
}

/// Reconciler for ACM certificates.
pub struct CertificateReconciler<A: ?Sized> {
    authority: Arc<A>,
    policy: IssuancePolicy,
}

impl<A> CertificateReconciler<A>
where
    A: CertificateAuthority + ?Sized,
{
    /// Create a reconciler using `authority` and the given issuance policy.
    pub fn new(authority: Arc<A>, policy: IssuancePolicy) -> Self {
        Self { authority, policy }
    }

    /// Request a certificate for `spec` and optionally wait for issuance.
    async fn request_certificate(
        &self,
        request: &ResourceRequest,
        spec: &CertificateSpec,
        token: String,
    ) -> Result<ReconcileResult, ReconcileError> {
        let certificate_request = spec.to_request(token);
        info!(
            resource = %request.logical_resource_id,
            domain = %certificate_request.domain_name,
            alternatives = ?certificate_request.subject_alternative_names,
            validation_options = certificate_request.validation_options.len(),
            "Requesting certificate"
        );

        let arn = self
            .authority
            .request_certificate(&certificate_request)
            .await?;
        metrics::record_resource_created(RESOURCE_TYPE_CERTIFICATE);
        info!(arn = %arn, "Certificate requested");

        if !spec.await_issuance {
            return Ok(ReconcileResult::success(REASON_CERTIFICATE_REQUESTED, arn));
        }

        let reason = match self.wait_for(request, spec, &arn).await {
            IssuanceState::Issued { .. } => REASON_CERTIFICATE_ISSUED,
            IssuanceState::Pending => REASON_CERTIFICATE_PENDING,
        };
        Ok(ReconcileResult::success(reason, arn))
    }

    async fn wait_for(
        &self,
        request: &ResourceRequest,
        spec: &CertificateSpec,
        arn: &str,
    ) -> IssuanceState {
        info!(
            arn = %arn,
            strategy = ?self.policy.strategy,
            remaining = ?request.remaining_time(),
            "Waiting for certificate issuance"
        );
        await_issuance(
            self.authority.as_ref(),
            &spec.primary_domain,
            Some(arn),
            request.deadline,
            &self.policy,
        )
        .await
    }
}

#[async_trait::async_trait]
impl<A> Reconciler for CertificateReconciler<A>
where
    A: CertificateAuthority + ?Sized,
{
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE_CERTIFICATE
    }

    async fn create(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        let spec = CertificateSpec::from_request(request)?;
        let token = idempotency_token(&request.stack_id, &request.logical_resource_id);
        self.request_certificate(request, &spec, token).await
    }

    async fn update(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        let spec = CertificateSpec::from_request(request)?;
        let arn = request.physical_resource_id.as_str();

        if !is_certificate_arn(arn) {
            info!(
                physical_id = arn,
                "Physical id is not a certificate ARN, creating a certificate"
            );
            return self.create(request).await;
        }

        let record = match self.authority.describe_certificate(arn).await {
            Ok(record) => record,
            Err(e) if e.class().is_client_side() => {
                warn!(arn = arn, error = %e, "Certificate not found, creating a new one");
                return self.create(request).await;
            }
            Err(e) => return Err(e.into()),
        };

        if record.status == CertificateStatus::PendingValidation && spec.await_issuance {
            debug!(arn = arn, "Certificate pending validation, waiting for issuance");
            self.wait_for(request, &spec, arn).await;
        }

        let declared = spec.domain_set();
        if declared != record.domains {
            info!(
                arn = arn,
                declared = ?declared,
                current = ?record.domains,
                "Domain names changed, replacing certificate"
            );
            match self.authority.delete_certificate(arn).await {
                Ok(()) => metrics::record_resource_deleted(RESOURCE_TYPE_CERTIFICATE),
                Err(e) => error!(arn = arn, error = %e, "Failure deleting certificate"),
            }
            let token =
                replacement_token(&request.stack_id, &request.logical_resource_id, &declared);
            return self.request_certificate(request, &spec, token).await;
        }

        Ok(ReconcileResult::success(REASON_CERTIFICATE_UNCHANGED, arn))
    }

    async fn delete(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        let arn = request.physical_id_or_sentinel();

        match self.authority.delete_certificate(&arn).await {
            Ok(()) => {
                metrics::record_resource_deleted(RESOURCE_TYPE_CERTIFICATE);
                info!(arn = %arn, "Certificate deleted");
                Ok(ReconcileResult::success(REASON_CERTIFICATE_DELETED, arn))
            }
            Err(e) => {
                error!(arn = %arn, error = %e, "Failure deleting certificate");
                Ok(ReconcileResult::success(
                    format!("{REASON_CERTIFICATE_DELETE_FAILED}: {e}"),
                    arn,
                ))
            }
        }
    }
}
