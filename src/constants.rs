// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for certbinder.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Resource Type Constants
// ============================================================================

/// Resource type label for the certificate reconciler
pub const RESOURCE_TYPE_CERTIFICATE: &str = "Certificate";

/// Resource type label for the distribution binder
pub const RESOURCE_TYPE_CERTIFICATE_BINDING: &str = "CertificateBinding";

// ============================================================================
// Declared Property Names
// ============================================================================

/// Ordered list of domains; the first entry is the primary domain
pub const PROP_DOMAINS: &str = "Domains";

/// Per-domain validation domain overrides
pub const PROP_VALIDATION_OPTIONS: &str = "ValidationOptions";

/// Single validation domain applied to the primary domain
pub const PROP_VALIDATION_DOMAIN: &str = "ValidationDomain";

/// Wait for issuance before answering
pub const PROP_AWAIT: &str = "Await";

/// ARN of the certificate to bind
pub const PROP_CERTIFICATE_ARN: &str = "CertificateArn";

/// Identifier of the distribution to bind to
pub const PROP_DISTRIBUTION_ID: &str = "DistributionId";

// ============================================================================
// Physical Identifier Constants
// ============================================================================

/// Physical resource id reported when no real resource exists
pub const PHYSICAL_ID_COULD_NOT_CREATE: &str = "could-not-create";

/// Service segment of an ACM certificate ARN (`arn:<partition>:acm:...`)
pub const ACM_ARN_SERVICE: &str = "acm";

// ============================================================================
// Idempotency Token Constants
// ============================================================================

/// Prefix hashed together with the stack and logical resource ids
pub const IDEMPOTENCY_TOKEN_PREFIX: &str = "cfn";

/// ACM rejects idempotency tokens longer than 32 characters
pub const IDEMPOTENCY_TOKEN_MAX_LEN: usize = 30;

// ============================================================================
// Issuance Polling Constants
// ============================================================================

/// Time between checks of the issued certificate list (5 seconds)
pub const ISSUANCE_POLL_INTERVAL_SECS: u64 = 5;

/// Time kept in reserve to answer the orchestrator after giving up (10 seconds)
pub const ISSUANCE_SAFETY_MARGIN_SECS: u64 = 10;

/// Default time budget for one invocation (5 minutes)
pub const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 300;

/// Shortest sleep between issuance checks (1 second)
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Upper bound for any configured duration (1 day)
pub const MAX_DURATION_SECS: u64 = 86_400;

// ============================================================================
// Viewer Certificate Policy Constants
// ============================================================================

/// Certificate source value for ACM-managed certificates
pub const CERTIFICATE_SOURCE_ACM: &str = "acm";

/// Certificate source value for IAM server certificates
pub const CERTIFICATE_SOURCE_IAM: &str = "iam";

/// Certificate source value for the distribution's default `*.cloudfront.net` certificate
pub const CERTIFICATE_SOURCE_CLOUDFRONT: &str = "cloudfront";

/// Minimum TLS protocol version applied when binding a certificate
pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1";

/// SSL support method applied when binding a certificate
pub const SSL_SUPPORT_METHOD_SNI_ONLY: &str = "sni-only";

// ============================================================================
// Callback Constants
// ============================================================================

/// Timeout for the PUT to the orchestrator's response URL (10 seconds)
///
/// Must not exceed [`ISSUANCE_SAFETY_MARGIN_SECS`]: after an await times out, the PUT runs
/// inside the reserved margin.
pub const CALLBACK_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Server Constants
// ============================================================================

/// Default listen address for `certbinder serve`
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
