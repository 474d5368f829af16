// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reason strings reported back to the orchestrator.
//!
//! Every response envelope carries a human-readable `Reason`. It is mandatory when the
//! status is `FAILED` and informational otherwise. Keeping the strings here means tests
//! and reconcilers agree on the exact wording.

// ============================================================================
// Generic Reasons
// ============================================================================

/// Fallback reason used when a reconciler raised an internal error or panicked.
pub const REASON_UNHANDLED_EXCEPTION: &str = "Exception was raised while handling custom resource";

// ============================================================================
// Certificate Reasons
// ============================================================================

/// A certificate request was accepted by the authority.
pub const REASON_CERTIFICATE_REQUESTED: &str = "Cert request created successfully";

/// A certificate request was accepted and the authority has already issued it.
pub const REASON_CERTIFICATE_ISSUED: &str = "Cert request created and issued";

/// A certificate request was accepted but issuance is still pending validation.
///
/// Returned both when waiting timed out and when waiting is deferred to a later update.
pub const REASON_CERTIFICATE_PENDING: &str =
    "Cert request created, issuance pending validation";

/// The declared domains match the existing certificate.
pub const REASON_CERTIFICATE_UNCHANGED: &str = "Nothing to do, we think";

/// The certificate was deleted.
pub const REASON_CERTIFICATE_DELETED: &str = "Cert deleted";

/// Deleting the certificate failed; the delete still reports success.
pub const REASON_CERTIFICATE_DELETE_FAILED: &str =
    "Some exception was raised while deleting the cert";

// ============================================================================
// Binding Reasons
// ============================================================================

/// The distribution already references the declared certificate.
pub const REASON_BINDING_ALREADY_CONNECTED: &str = "Already connected, easy!";

/// The distribution referenced a different ACM certificate and was switched.
pub const REASON_BINDING_CHANGED_CERTIFICATE: &str = "Changed ACM cert ID";

/// The distribution used another certificate mechanism and now uses ACM.
pub const REASON_BINDING_ASSOCIATED: &str = "Associated ACM cert";

/// Bindings are never reverted on delete.
pub const REASON_BINDING_DISSOCIATE_UNSUPPORTED: &str =
    "Dissociating is not supported because the distribution will likely be deleted after this";

/// The distribution has no viewer certificate block to swap.
pub const REASON_BINDING_NO_VIEWER_CERTIFICATE: &str = "No viewercert configuration";

/// The certificate probe failed.
pub const REASON_BINDING_BAD_CERTIFICATE: &str = "Bad CertificateArn";

/// The distribution probe failed.
pub const REASON_BINDING_BAD_DISTRIBUTION: &str =
    "Failed to get CloudFront distribution, check DistributionId property";

/// The distribution changed between read and write.
pub const REASON_BINDING_CONFLICT: &str =
    "Distribution configuration changed concurrently, retry the update";
