// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Delivery of response envelopes to the orchestrator.
//!
//! The orchestrator hands every event a pre-signed `ResponseURL` and waits for a JSON
//! [`ResponseEnvelope`] to be PUT there. The URL is signed without a content type, so the
//! request carries an empty `Content-Type` header; any other value breaks the signature.

use crate::constants::CALLBACK_TIMEOUT_SECS;
use crate::errors::CallbackError;
use crate::request::ResponseEnvelope;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// HTTP client that PUTs response envelopes to callback URLs.
#[derive(Clone, Debug)]
pub struct CallbackClient {
    client: HttpClient,
}

impl CallbackClient {
    /// Create a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a client with the default callback timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_default_timeout() -> Result<Self, reqwest::Error> {
        Self::new(Duration::from_secs(CALLBACK_TIMEOUT_SECS))
    }

    /// PUT `envelope` to `response_url`.
    ///
    /// Exactly one attempt is made. The caller decides what to do with a failure; the
    /// dispatch wrapper only logs it.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`] if the URL is invalid, the envelope cannot be serialized,
    /// the endpoint is unreachable, or it answers with a non-success status.
    pub async fn send(
        &self,
        response_url: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), CallbackError> {
        let url = Url::parse(response_url).map_err(|source| CallbackError::InvalidUrl {
            url: response_url.to_string(),
            source,
        })?;
        let body = serde_json::to_vec(envelope)?;

        debug!(
            url = %redact(&url),
            bytes = body.len(),
            "Sending response envelope"
        );

        let response = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|source| CallbackError::Transport {
                url: redact(&url),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CallbackError::Rejected {
                url: redact(&url),
                status: status.as_u16(),
                body,
            });
        }

        info!(url = %redact(&url), status = %status, "Response envelope delivered");
        Ok(())
    }
}

/// URL without its query string; pre-signed query parameters are credentials.
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.to_string()
}
