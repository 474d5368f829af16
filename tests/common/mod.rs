// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use certbinder::errors::ProviderError;
use certbinder::providers::{
    CertificateAuthority, CertificateRecord, CertificateRequest, CertificateStatus,
    CertificateSummary, DistributionApi, DistributionSnapshot,
};
use certbinder::request::{CustomResourceEvent, ResponseEnvelope};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STACK_ID: &str = "arn:aws:cloudformation:us-east-1:123456789012:stack/web/1";
pub const DISTRIBUTION_ID: &str = "E2QWRUHEXAMPLE";

/// Certificate authority keeping certificates in memory.
///
/// Requests with a token seen before return the same certificate, like ACM does.
#[derive(Default)]
pub struct InMemoryAuthority {
    certificates: Mutex<BTreeMap<String, CertificateRecord>>,
    tokens: Mutex<BTreeMap<String, String>>,
    primary_domains: Mutex<BTreeMap<String, String>>,
    pub request_count: Mutex<usize>,
    pub delete_count: Mutex<usize>,
}

impl InMemoryAuthority {
    pub fn certificate(&self, arn: &str) -> Option<CertificateRecord> {
        self.certificates.lock().unwrap().get(arn).cloned()
    }

    pub fn count(&self) -> usize {
        self.certificates.lock().unwrap().len()
    }

    /// Mark every certificate as issued.
    pub fn issue_all(&self) {
        for record in self.certificates.lock().unwrap().values_mut() {
            record.status = CertificateStatus::Issued;
        }
    }
}

#[async_trait::async_trait]
impl CertificateAuthority for InMemoryAuthority {
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, ProviderError> {
        *self.request_count.lock().unwrap() += 1;
        if let Some(arn) = self.tokens.lock().unwrap().get(&request.idempotency_token) {
            return Ok(arn.clone());
        }

        let mut certificates = self.certificates.lock().unwrap();
        let arn = format!(
            "arn:aws:acm:us-east-1:123456789012:certificate/{}",
            *self.request_count.lock().unwrap()
        );
        let domains: BTreeSet<String> = std::iter::once(request.domain_name.clone())
            .chain(request.subject_alternative_names.iter().cloned())
            .collect();
        certificates.insert(
            arn.clone(),
            CertificateRecord {
                arn: arn.clone(),
                status: CertificateStatus::PendingValidation,
                domains,
            },
        );
        self.tokens
            .lock()
            .unwrap()
            .insert(request.idempotency_token.clone(), arn.clone());
        self.primary_domains
            .lock()
            .unwrap()
            .insert(arn.clone(), request.domain_name.clone());
        Ok(arn)
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateRecord, ProviderError> {
        self.certificate(arn).ok_or_else(|| {
            ProviderError::new("DescribeCertificate", arn, Some(400), "ResourceNotFoundException")
        })
    }

    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        *self.delete_count.lock().unwrap() += 1;
        match self.certificates.lock().unwrap().remove(arn) {
            Some(_) => Ok(()),
            None => Err(ProviderError::new(
                "DeleteCertificate",
                arn,
                Some(400),
                "ResourceNotFoundException",
            )),
        }
    }

    async fn list_issued_certificates(&self) -> Result<Vec<CertificateSummary>, ProviderError> {
        let primary_domains = self.primary_domains.lock().unwrap();
        Ok(self
            .certificates
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.status == CertificateStatus::Issued)
            .filter_map(|record| {
                primary_domains.get(&record.arn).map(|domain| CertificateSummary {
                    domain_name: domain.clone(),
                    arn: record.arn.clone(),
                })
            })
            .collect())
    }

    async fn probe_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        self.describe_certificate(arn).await.map(|_| ())
    }
}

/// Single distribution with etag concurrency control.
pub struct InMemoryDistributions {
    config: Mutex<Value>,
    etag: Mutex<u32>,
    pub update_count: Mutex<usize>,
}

impl InMemoryDistributions {
    pub fn with_default_certificate() -> Self {
        Self {
            config: Mutex::new(json!({
                "CallerReference": "site",
                "Enabled": true,
                "ViewerCertificate": {
                    "CloudFrontDefaultCertificate": true,
                    "CertificateSource": "cloudfront"
                }
            })),
            etag: Mutex::new(1),
            update_count: Mutex::new(0),
        }
    }

    pub fn config(&self) -> Value {
        self.config.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DistributionApi for InMemoryDistributions {
    type Config = Value;

    async fn get_distribution(&self, id: &str) -> Result<(), ProviderError> {
        if id == DISTRIBUTION_ID {
            Ok(())
        } else {
            Err(ProviderError::new("GetDistribution", id, Some(404), "NoSuchDistribution"))
        }
    }

    async fn get_distribution_config(
        &self,
        id: &str,
    ) -> Result<DistributionSnapshot<Value>, ProviderError> {
        self.get_distribution(id).await?;
        Ok(DistributionSnapshot {
            config: self.config(),
            etag: format!("E{}", self.etag.lock().unwrap()),
        })
    }

    async fn update_distribution_config(
        &self,
        id: &str,
        etag: &str,
        config: Value,
    ) -> Result<String, ProviderError> {
        let mut current = self.etag.lock().unwrap();
        if etag != format!("E{current}") {
            return Err(ProviderError::new(
                "UpdateDistribution",
                id,
                Some(412),
                "PreconditionFailed",
            ));
        }
        *current += 1;
        *self.update_count.lock().unwrap() += 1;
        *self.config.lock().unwrap() = config;
        Ok(format!("E{current}"))
    }
}

/// Start a callback endpoint accepting every PUT.
pub async fn callback_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// Build an event whose `ResponseURL` points at `callback`.
pub fn event(
    callback: &MockServer,
    request_type: &str,
    logical_resource_id: &str,
    physical_resource_id: Option<&str>,
    properties: Value,
) -> CustomResourceEvent {
    let mut raw = json!({
        "RequestType": request_type,
        "ResponseURL": format!("{}/callback?X-Amz-Signature=abc", callback.uri()),
        "StackId": STACK_ID,
        "RequestId": format!("{request_type}-{logical_resource_id}"),
        "LogicalResourceId": logical_resource_id,
        "ResourceProperties": properties
    });
    if let Some(id) = physical_resource_id {
        raw["PhysicalResourceId"] = json!(id);
    }
    serde_json::from_value(raw).unwrap()
}

/// Envelopes received by `callback`, in arrival order.
pub async fn delivered(callback: &MockServer) -> Vec<ResponseEnvelope> {
    callback
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.body_json().unwrap())
        .collect()
}

pub fn budget() -> Duration {
    Duration::from_secs(300)
}
