// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the certificate reconcilers.
//!
//! All metrics use the namespace prefix `certbinder_` and are exposed by the `serve`
//! command on `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Invocations per resource type, operation and outcome
//! - **Resource Lifecycle Metrics** - Remote objects created, updated and deleted
//! - **Error Metrics** - Failures by category
//! - **Callback Metrics** - Response envelope deliveries
//!
//! # Example
//!
//! ```rust,no_run
//! use certbinder::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Certificate", "Create", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "certbinder";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations
///
/// Labels:
/// - `resource_type`: `Certificate` or `CertificateBinding`
/// - `operation`: `Create`, `Update` or `Delete`
/// - `status`: `success` or `failed`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type, operation and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds, including any issuance wait
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type and operation",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]);
    let histogram = HistogramVec::new(opts, &["resource_type", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Invocations currently being handled by the server
pub static INVOCATIONS_IN_FLIGHT: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_invocations_in_flight"),
        "Number of invocations currently being handled",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of remote resources created
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_created_total"),
        "Total number of resources created by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of remote resources updated
pub static RESOURCES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_updated_total"),
        "Total number of resources updated by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of remote resources deleted
pub static RESOURCES_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_deleted_total"),
        "Total number of resources deleted by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `error_type`: Category (`validation`, `not_found`, `conflict`, `provider`, `panic`, ...)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of failed provider calls
///
/// Labels:
/// - `operation`: Provider operation (e.g., `DescribeCertificate`)
/// - `class`: Status class (`not_found`, `conflict`, `client_error`, `server_error`, `unreachable`)
pub static PROVIDER_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_provider_errors_total"),
        "Total number of failed provider calls by operation and status class",
    );
    let counter = CounterVec::new(opts, &["operation", "class"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Callback Metrics
// ============================================================================

/// Total number of response envelope deliveries
///
/// Labels:
/// - `outcome`: `delivered` or `failed`
pub static CALLBACK_DELIVERIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_callback_deliveries_total"),
        "Total number of response envelope deliveries by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a reconciliation that reported `SUCCESS`
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled (e.g., `Certificate`)
/// * `operation` - Lifecycle operation (e.g., `Create`)
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(resource_type: &str, operation: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, operation, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation that reported `FAILED`
pub fn record_reconciliation_failure(resource_type: &str, operation: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, operation, "failed"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
}

/// Record resource creation
pub fn record_resource_created(resource_type: &str) {
    RESOURCES_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource update
pub fn record_resource_updated(resource_type: &str) {
    RESOURCES_UPDATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource deletion
pub fn record_resource_deleted(resource_type: &str) {
    RESOURCES_DELETED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where error occurred
/// * `error_type` - Category of error (see [`crate::errors::ReconcileError::error_type`])
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record a failed provider call
pub fn record_provider_error(operation: &str, class: &str) {
    PROVIDER_ERRORS_TOTAL
        .with_label_values(&[operation, class])
        .inc();
}

/// Record the outcome of a callback delivery
pub fn record_callback_delivery(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    CALLBACK_DELIVERIES_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
