// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dispatch wrapper around the reconcilers.
//!
//! Every inbound event produces exactly one response envelope, whatever the reconciler
//! does: typed errors become `FAILED` results with specific reasons, and anything
//! unexpected (an internal error or a panic) becomes `FAILED` with a generic reason. The
//! envelope is then PUT to the event's `ResponseURL`.
//!
//! # Example
//!
//! ```rust,no_run
//! use certbinder::callback::CallbackClient;
//! use certbinder::dispatch::Dispatcher;
//! use certbinder::reconcilers::Reconciler;
//! use certbinder::request::CustomResourceEvent;
//! use std::time::Duration;
//!
//! async fn handle(reconciler: &dyn Reconciler, event: CustomResourceEvent) -> anyhow::Result<()> {
//!     let dispatcher = Dispatcher::new(CallbackClient::with_default_timeout()?, Duration::from_secs(300));
//!     let envelope = dispatcher.handle(reconciler, &event).await;
//!     println!("{}", serde_json::to_string(&envelope)?);
//!     Ok(())
//! }
//! ```

use crate::callback::CallbackClient;
use crate::metrics;
use crate::reconcilers::Reconciler;
use crate::request::{
    CustomResourceEvent, ReconcileResult, ResourceRequest, ResponseEnvelope, ResultStatus,
};
use crate::status_reasons::REASON_UNHANDLED_EXCEPTION;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runs reconcilers and delivers their envelopes.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    callback: CallbackClient,
    budget: Duration,
}

impl Dispatcher {
    /// Create a dispatcher that gives every invocation `budget` of wall-clock time.
    #[must_use]
    pub fn new(callback: CallbackClient, budget: Duration) -> Self {
        Self { callback, budget }
    }

    /// Reconcile `event`, deliver the envelope and return it.
    ///
    /// Delivery failures are logged and counted, never returned.
    pub async fn handle<R>(&self, reconciler: &R, event: &CustomResourceEvent) -> ResponseEnvelope
    where
        R: Reconciler + ?Sized,
    {
        let envelope = self.respond(reconciler, event).await;
        self.deliver(event, &envelope).await;
        envelope
    }

    /// Reconcile `event` and build the envelope without delivering it.
    pub async fn respond<R>(&self, reconciler: &R, event: &CustomResourceEvent) -> ResponseEnvelope
    where
        R: Reconciler + ?Sized,
    {
        let resource_type = reconciler.resource_type();
        let operation = event.request_type.as_str();
        let request = ResourceRequest::from_event(event, self.budget);

        debug!(
            resource_type = resource_type,
            operation = operation,
            stack = %event.stack_id,
            request_id = %event.request_id,
            resource = %event.logical_resource_id,
            physical_id = ?event.physical_resource_id,
            properties = %serde_json::Value::Object(event.resource_properties.clone()),
            "Received custom resource event"
        );

        let start = Instant::now();
        let outcome = AssertUnwindSafe(reconciler.reconcile(&request))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!(
                    resource_type = resource_type,
                    operation = operation,
                    resource = %event.logical_resource_id,
                    error = %e,
                    error_type = e.error_type(),
                    "Reconciliation failed"
                );
                metrics::record_error(resource_type, e.error_type());
                if let Some(provider) = e.provider_error() {
                    metrics::record_provider_error(provider.operation, provider.class().as_str());
                }
                e.into_result(&request)
            }
            Err(panic) => {
                error!(
                    resource_type = resource_type,
                    operation = operation,
                    resource = %event.logical_resource_id,
                    panic = %panic_message(panic.as_ref()),
                    "Reconciler panicked"
                );
                metrics::record_error(resource_type, "panic");
                ReconcileResult::failed(
                    REASON_UNHANDLED_EXCEPTION,
                    request.physical_id_or_sentinel(),
                )
            }
        };

        let result = ensure_reason(result);
        if result.is_success() {
            metrics::record_reconciliation_success(resource_type, operation, start.elapsed());
        } else {
            metrics::record_reconciliation_failure(resource_type, operation, start.elapsed());
        }

        let envelope = ResponseEnvelope::from_result(event, result);
        match serde_json::to_string(&envelope) {
            Ok(body) => info!(
                resource_type = resource_type,
                operation = operation,
                response = %body,
                "Reconciliation complete"
            ),
            Err(e) => warn!(error = %e, "Failed to render response envelope for logging"),
        }
        envelope
    }

    /// PUT `envelope` to the event's `ResponseURL`, logging any failure.
    pub async fn deliver(&self, event: &CustomResourceEvent, envelope: &ResponseEnvelope) {
        match self.callback.send(&event.response_url, envelope).await {
            Ok(()) => metrics::record_callback_delivery(true),
            Err(e) => {
                metrics::record_callback_delivery(false);
                error!(
                    request_id = %event.request_id,
                    resource = %event.logical_resource_id,
                    error = %e,
                    "Failed to deliver response envelope"
                );
            }
        }
    }
}

/// A `FAILED` result always carries a reason.
fn ensure_reason(mut result: ReconcileResult) -> ReconcileResult {
    if result.status == ResultStatus::Failed
        && result.reason.as_deref().is_none_or(|reason| reason.trim().is_empty())
    {
        result.reason = Some(REASON_UNHANDLED_EXCEPTION.to_string());
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
