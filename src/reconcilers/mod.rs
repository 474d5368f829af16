// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom resource reconcilers.
//!
//! Each reconciler turns one [`ResourceRequest`] into remote provider calls and a
//! [`ReconcileResult`]. Reconcilers are stateless between invocations: everything they
//! know comes from the request and from what they re-read from the provider.
//!
//! # Reconciliation Architecture
//!
//! 1. **Validate** - Parse the declared properties into a typed spec
//! 2. **Observe** - Read the current remote state
//! 3. **Decide** - No-op, mutate, or replace
//! 4. **Report** - Return a result; errors are typed [`ReconcileError`]s
//!
//! # Available Reconcilers
//!
//! - [`CertificateReconciler`] - Requests, replaces and deletes ACM certificates
//! - [`DistributionBinder`] - Points a CloudFront distribution at a certificate
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use certbinder::providers::acm::AcmCertificateAuthority;
//! use certbinder::reconcilers::{CertificateReconciler, IssuancePolicy, Reconciler};
//! use certbinder::request::ResourceRequest;
//! use std::sync::Arc;
//!
//! async fn reconcile(request: ResourceRequest) -> anyhow::Result<()> {
//!     let shared = aws_config::load_from_env().await;
//!     let authority = Arc::new(AcmCertificateAuthority::from_conf(&shared, None));
//!     let reconciler = CertificateReconciler::new(authority, IssuancePolicy::default());
//!
//!     let result = reconciler.reconcile(&request).await?;
//!     println!("{:?}", result.status);
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod certificate;
pub mod issuance;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;


pub use binding::{classify_binding, BindingSpec, BindingState, DistributionBinder};
pub use certificate::{idempotency_token, CertificateReconciler, CertificateSpec};
pub use issuance::{await_issuance, AwaitStrategy, IssuancePolicy, IssuanceState};

use crate::errors::ReconcileError;
use crate::request::{ReconcileResult, RequestType, ResourceRequest};

/// A reconciler for one custom resource type.
///
/// Implementors provide one method per lifecycle operation; [`Reconciler::reconcile`]
/// routes a request to the matching one.
#[async_trait::async_trait]
pub trait Reconciler: Send + Sync {
    /// Resource type label used in logs and metrics.
    fn resource_type(&self) -> &'static str;

    /// Handle a Create request.
    async fn create(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError>;

    /// Handle an Update request.
    async fn update(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError>;

    /// Handle a Delete request. Implementations should not fail on remote errors.
    async fn delete(&self, request: &ResourceRequest) -> Result<ReconcileResult, ReconcileError>;

    /// Route a request to the method for its operation.
    async fn reconcile(
        &self,
        request: &ResourceRequest,
    ) -> Result<ReconcileResult, ReconcileError> {
        match request.request_type {
            RequestType::Create => self.create(request).await,
            RequestType::Update => self.update(request).await,
            RequestType::Delete => self.delete(request).await,
        }
    }
}
