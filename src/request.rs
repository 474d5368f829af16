// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom resource request and response envelopes.
//!
//! The orchestrator sends one [`CustomResourceEvent`] per lifecycle event and expects a
//! [`ResponseEnvelope`] back on the event's `ResponseURL`. Reconcilers never see the raw
//! event: they receive an immutable [`ResourceRequest`] carrying the declared properties,
//! the prior physical id and the invocation deadline, and answer with a
//! [`ReconcileResult`].
//!
//! # Example
//!
//! ```rust
//! use certbinder::request::{CustomResourceEvent, RequestType};
//!
//! let event: CustomResourceEvent = serde_json::from_value(serde_json::json!({
//!     "RequestType": "Create",
//!     "ResponseURL": "https://example.com/callback",
//!     "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/web/1",
//!     "RequestId": "req-1",
//!     "LogicalResourceId": "SiteCertificate",
//!     "ResourceProperties": { "Domains": ["example.com"] }
//! }))
//! .unwrap();
//!
//! assert_eq!(event.request_type, RequestType::Create);
//! ```

use crate::constants::{MAX_DURATION_SECS, PHYSICAL_ID_COULD_NOT_CREATE};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;

/// Lifecycle operation requested by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    /// Name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound custom resource event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    /// Create, Update or Delete
    pub request_type: RequestType,

    /// Pre-signed URL the response envelope is PUT to
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    /// Stack the resource belongs to
    pub stack_id: String,

    /// Correlation id echoed in the response
    pub request_id: String,

    /// Template name of the resource
    pub logical_resource_id: String,

    /// Resource type from the template (e.g., `Custom::Certificate`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Physical id assigned on Create; present on Update and Delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    /// Declared properties
    #[serde(default)]
    pub resource_properties: Map<String, Value>,

    /// Previous declared properties; present on Update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl CustomResourceEvent {
    /// Read an event from a JSON file, or from stdin when `path` is `-`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or is not a valid event.
    pub async fn read_from(path: &Path) -> anyhow::Result<Self> {
        let raw = if path.as_os_str() == "-" {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read event from stdin")?;
            raw
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read event file {}", path.display()))?
        };

        serde_json::from_str(&raw).context("Failed to parse custom resource event")
    }
}

/// Immutable view of one invocation handed to a reconciler.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    /// Requested operation
    pub request_type: RequestType,
    /// Declared properties
    pub properties: Map<String, Value>,
    /// Prior physical id; empty on Create
    pub physical_resource_id: String,
    /// Stack identifier
    pub stack_id: String,
    /// Logical resource name
    pub logical_resource_id: String,
    /// Point in time after which the invocation environment stops listening
    pub deadline: Instant,
}

impl ResourceRequest {
    /// Build a request from an event with `budget` of wall-clock time left.
    ///
    /// Budgets above [`MAX_DURATION_SECS`] are clamped.
    #[must_use]
    pub fn from_event(event: &CustomResourceEvent, budget: Duration) -> Self {
        Self {
            request_type: event.request_type,
            properties: event.resource_properties.clone(),
            physical_resource_id: event.physical_resource_id.clone().unwrap_or_default(),
            stack_id: event.stack_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            deadline: Instant::now() + budget.min(Duration::from_secs(MAX_DURATION_SECS)),
        }
    }

    /// Time left before the deadline.
    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Look up a declared property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Prior physical id, or the `could-not-create` sentinel when there is none.
    #[must_use]
    pub fn physical_id_or_sentinel(&self) -> String {
        if self.physical_resource_id.is_empty() {
            PHYSICAL_ID_COULD_NOT_CREATE.to_string()
        } else {
            self.physical_resource_id.clone()
        }
    }
}

/// Outcome status reported to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// What a reconciler reports for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileResult {
    /// Success or failure
    pub status: ResultStatus,
    /// Human-readable explanation; always present when failed
    pub reason: Option<String>,
    /// Physical id the orchestrator should track
    pub physical_resource_id: String,
    /// Attributes exposed to the template; currently always empty
    pub data: Map<String, Value>,
}

impl ReconcileResult {
    /// Successful result with a reason.
    pub fn success(reason: impl Into<String>, physical_resource_id: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Success,
            reason: Some(reason.into()),
            physical_resource_id: physical_resource_id.into(),
            data: Map::new(),
        }
    }

    /// Failed result with a reason.
    pub fn failed(reason: impl Into<String>, physical_resource_id: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id: physical_resource_id.into(),
            data: Map::new(),
        }
    }

    /// True when the status is [`ResultStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Response document PUT to the orchestrator's callback URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Merge a reconciler result into the correlation fields of `event`.
    #[must_use]
    pub fn from_result(event: &CustomResourceEvent, result: ReconcileResult) -> Self {
        Self {
            status: result.status,
            reason: result.reason,
            physical_resource_id: result.physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: result.data,
        }
    }
}
