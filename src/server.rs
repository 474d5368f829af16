// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP front end for the reconcilers.
//!
//! Events are accepted on one route per resource kind and answered with `202 Accepted`
//! immediately; reconciliation runs in a spawned task and its outcome is delivered to the
//! event's `ResponseURL`, exactly as when the binary is invoked directly.
//!
//! # Routes
//!
//! - `POST /v1/certificates` - Certificate events
//! - `POST /v1/certificate-bindings` - Binding events
//! - `GET /healthz` - Liveness
//! - `GET /metrics` - Prometheus metrics

use crate::dispatch::Dispatcher;
use crate::metrics::{gather_metrics, INVOCATIONS_IN_FLIGHT};
use crate::reconcilers::Reconciler;
use crate::request::CustomResourceEvent;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub certificates: Arc<dyn Reconciler>,
    pub bindings: Arc<dyn Reconciler>,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/certificates", post(accept_certificate))
        .route("/v1/certificate-bindings", post(accept_binding))
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve on `listener` until `shutdown` completes.
///
/// In-flight reconciliations are detached tasks and are not awaited on shutdown.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Listening for custom resource events");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn accept_certificate(
    State(state): State<AppState>,
    Json(event): Json<CustomResourceEvent>,
) -> Response {
    let reconciler = Arc::clone(&state.certificates);
    accept(state.dispatcher, reconciler, event)
}

async fn accept_binding(
    State(state): State<AppState>,
    Json(event): Json<CustomResourceEvent>,
) -> Response {
    let reconciler = Arc::clone(&state.bindings);
    accept(state.dispatcher, reconciler, event)
}

fn accept(
    dispatcher: Dispatcher,
    reconciler: Arc<dyn Reconciler>,
    event: CustomResourceEvent,
) -> Response {
    info!(
        resource_type = reconciler.resource_type(),
        operation = %event.request_type,
        request_id = %event.request_id,
        resource = %event.logical_resource_id,
        "Accepted custom resource event"
    );

    let request_id = event.request_id.clone();
    INVOCATIONS_IN_FLIGHT.inc();
    tokio::spawn(async move {
        dispatcher.handle(reconciler.as_ref(), &event).await;
        INVOCATIONS_IN_FLIGHT.dec();
    });

    (StatusCode::ACCEPTED, Json(json!({ "RequestId": request_id }))).into_response()
}

async fn metrics() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
