// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Distribution binding reconciliation logic.
//!
//! Points a CloudFront distribution's viewer certificate at an ACM certificate. A binding
//! has no remote object of its own; it exists only as a mutation of the distribution
//! configuration, so its physical id is synthesized from the two identifiers.
//!
//! # Concurrency
//!
//! The configuration is read together with its etag and written back conditionally on
//! that etag. If anything changed the distribution in between, the provider rejects the
//! write and the binding reports `FAILED`; the orchestrator re-invokes it from a fresh
//! read. There is no retry here.
//!
//! # Unset viewer certificates
//!
//! The binder swaps certificates, it does not originate a viewer certificate block. A
//! distribution without one is reported as a failure rather than converged.

use super::validation::require_string;
use super::Reconciler;
use crate::constants::{PROP_CERTIFICATE_ARN, PROP_DISTRIBUTION_ID, RESOURCE_TYPE_CERTIFICATE_BINDING};
use crate::errors::{ProviderError, ReconcileError};
use crate::http_errors::ErrorClass;
use crate::metrics;
use crate::providers::{
    CertificateAuthority, DistributionApi, DistributionSnapshot, ViewerCertificate,
    ViewerCertificateConfig,
};
use crate::request::{ReconcileResult, ResourceRequest};
use crate::status_reasons::{
    REASON_BINDING_ALREADY_CONNECTED, REASON_BINDING_ASSOCIATED, REASON_BINDING_BAD_CERTIFICATE,
    REASON_BINDING_BAD_DISTRIBUTION, REASON_BINDING_CHANGED_CERTIFICATE,
    REASON_BINDING_DISSOCIATE_UNSUPPORTED,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Physical id of a binding between `certificate_arn` and `distribution_id`.
#[must_use]
pub fn binding_physical_id(certificate_arn: &str, distribution_id: &str) -> String {
    format!("connection:{certificate_arn}:to:{distribution_id}")
}

/// Declared state of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    /// Certificate to serve
    pub certificate_arn: String,
    /// Distribution to serve it from
    pub distribution_id: String,
}

impl BindingSpec {
    /// Parse and validate the declared properties of `request`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `CertificateArn` or `DistributionId` is missing.
    pub fn from_request(request: &ResourceRequest) -> Result<Self, ReconcileError> {
        Ok(Self {
            certificate_arn: require_string(request, PROP_CERTIFICATE_ARN)?,
            distribution_id: require_string(request, PROP_DISTRIBUTION_ID)?,
        })
    }

    /// Synthetic physical id for this binding.
    #[must_use]
    pub fn physical_id(&self) -> String {
        binding_physical_id(&self.certificate_arn, &self.distribution_id)
    }
}

/// Current state of a distribution's viewer certificate relative to a declared binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No viewer certificate block at all
    Unset,
    /// Already serving the declared ACM certificate
    AlreadyBound,
    /// Serving something else and must be rewritten
    Rebind {
        /// The current certificate also comes from ACM
        from_acm: bool,
    },
}

/// Classify `existing` against the declared `certificate_arn`.
#[must_use]
pub fn classify_binding(existing: Option<&ViewerCertificate>, certificate_arn: &str) -> BindingState {
    match existing {
        None => BindingState::Unset,
        Some(current)
            if current.is_acm() && current.certificate.as_deref() == Some(certificate_arn) =>
        {
            BindingState::AlreadyBound
        }
        Some(current) => BindingState::Rebind {
            from_acm: current.is_acm(),
        },
    }
}

/// Reconciler binding certificates to distributions.
pub struct DistributionBinder<A: ?Sized, D: ?Sized> {
    authority: Arc<A>,
    distributions: Arc<D>,
}

impl<A, D> DistributionBinder<A, D>
where
    A: CertificateAuthority + ?Sized,
    D: DistributionApi + ?Sized,
{
    /// Create a binder using `authority` for certificate probes and `distributions` for
    /// configuration reads and writes.
    pub fn new(authority: Arc<A>, distributions: Arc<D>) -> Self {
        Self {
            authority,
            distributions,
        }
    }

    /// Probe that both referenced resources exist before mutating anything.
    async fn check_references(&self, spec: &BindingSpec) -> Result<(), ReconcileError> {
        if let Err(e) = self.authority.probe_certificate(&spec.certificate_arn).await {
            return Err(probe_failure(
                e,
                format!("{REASON_BINDING_BAD_CERTIFICATE}, got {}", spec.certificate_arn),
                "certificate",
            ));
        }

        if let Err(e) = self.distributions.get_distribution(&spec.distribution_id).await {
            return Err(probe_failure(
                e,
                REASON_BINDING_BAD_DISTRIBUTION.to_string(),
                "distribution",
            ));
        }

        Ok(())
    }

    /// Bind the declared certificate; shared by Create and Update.
    async fn bind(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        let spec = BindingSpec::from_request(request)?;
        self.check_references(&spec).await?;

        let DistributionSnapshot { mut config, etag } = self
            .distributions
            .get_distribution_config(&spec.distribution_id)
            .await?;

        let existing = config.viewer_certificate();
        let reason = match classify_binding(existing.as_ref(), &spec.certificate_arn) {
            BindingState::Unset => {
                error!(
                    distribution = %spec.distribution_id,
                    "Distribution has no viewer certificate configuration"
                );
                return Err(ReconcileError::MissingViewerCertificate {
                    distribution_id: spec.distribution_id,
                });
            }
            BindingState::AlreadyBound => {
                debug!(
                    distribution = %spec.distribution_id,
                    certificate = %spec.certificate_arn,
                    "Already configured - nothing to do"
                );
                REASON_BINDING_ALREADY_CONNECTED
            }
            BindingState::Rebind { from_acm } => {
                config.set_viewer_certificate(&ViewerCertificate::acm(&spec.certificate_arn));
                let new_etag = self
                    .distributions
                    .update_distribution_config(&spec.distribution_id, &etag, config)
                    .await
                    .map_err(|e| match e.class() {
                        ErrorClass::Conflict => ReconcileError::Conflict {
                            distribution_id: spec.distribution_id.clone(),
                            source: e,
                        },
                        _ => ReconcileError::Provider(e),
                    })?;

                metrics::record_resource_updated(RESOURCE_TYPE_CERTIFICATE_BINDING);
                info!(
                    distribution = %spec.distribution_id,
                    certificate = %spec.certificate_arn,
                    previous = ?existing.and_then(|current| current.certificate),
                    etag = %new_etag,
                    "Bound certificate to distribution"
                );

                if from_acm {
                    REASON_BINDING_CHANGED_CERTIFICATE
                } else {
                    REASON_BINDING_ASSOCIATED
                }
            }
        };

        Ok(ReconcileResult::success(reason, spec.physical_id()))
    }
}

/// Classify a failed existence probe: 4xx means the resource is not there.
fn probe_failure(source: ProviderError, reason: String, what: &str) -> ReconcileError {
    if source.class().is_client_side() {
        error!(
            resource = what,
            id = %source.resource_id,
            status = ?source.status,
            "Referenced {what} could not be found"
        );
        ReconcileError::NotFound { reason, source }
    } else {
        error!(
            resource = what,
            id = %source.resource_id,
            error = %source,
            "Failure checking referenced {what}"
        );
        ReconcileError::ProbeFailed { reason, source }
    }
}

#[async_trait::async_trait]
impl<A, D> Reconciler for DistributionBinder<A, D>
where
    A: CertificateAuthority + ?Sized,
    D: DistributionApi + ?Sized,
{
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE_CERTIFICATE_BINDING
    }

    async fn create(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        self.bind(request).await
    }

    async fn update(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        self.bind(request).await
    }

    async fn delete(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError> {
        info!(
            physical_id = %request.physical_resource_id,
            "Leaving distribution viewer certificate in place on delete"
        );
        Ok(ReconcileResult::success(
            REASON_BINDING_DISSOCIATE_UNSUPPORTED,
            request.physical_id_or_sentinel(),
        ))
    }
}
