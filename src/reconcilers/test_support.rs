// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory providers and request builders shared by the reconciler unit tests.

use crate::errors::ProviderError;
use crate::providers::{
    CertificateAuthority, CertificateRecord, CertificateRequest, CertificateStatus,
    CertificateSummary, DistributionApi, DistributionSnapshot,
};
use crate::request::{RequestType, ResourceRequest};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const STACK_ID: &str = "arn:aws:cloudformation:us-east-1:123456789012:stack/web/1";
pub const CERT_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/1111";
pub const NEW_CERT_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/2222";
pub const DISTRIBUTION_ID: &str = "E2QWRUHEXAMPLE";

/// Build a request with `budget` of time left.
pub fn request_with_budget(
    request_type: RequestType,
    properties: Value,
    physical_resource_id: &str,
    budget: Duration,
) -> ResourceRequest {
    let properties: Map<String, Value> = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ResourceRequest {
        request_type,
        properties,
        physical_resource_id: physical_resource_id.to_string(),
        stack_id: STACK_ID.to_string(),
        logical_resource_id: "SiteCertificate".to_string(),
        deadline: Instant::now() + budget,
    }
}

/// Build a request with the default five minute budget.
pub fn request(
    request_type: RequestType,
    properties: Value,
    physical_resource_id: &str,
) -> ResourceRequest {
    request_with_budget(
        request_type,
        properties,
        physical_resource_id,
        Duration::from_secs(300),
    )
}

pub fn not_found(operation: &'static str, id: &str) -> ProviderError {
    ProviderError::new(operation, id, Some(404), "not found")
}

pub fn server_error(operation: &'static str, id: &str) -> ProviderError {
    ProviderError::new(operation, id, Some(500), "internal failure")
}

/// Calls observed by [`FakeAuthority`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityCall {
    Request(CertificateRequest),
    Describe(String),
    Delete(String),
    ListIssued,
    Probe(String),
}

/// Scriptable in-memory certificate authority.
pub struct FakeAuthority {
    pub calls: Mutex<Vec<AuthorityCall>>,
    /// ARN returned by request-certificate
    pub issued_arn: Mutex<String>,
    /// Record returned by describe-certificate
    pub record: Mutex<Option<CertificateRecord>>,
    pub describe_error: Mutex<Option<ProviderError>>,
    pub delete_error: Mutex<Option<ProviderError>>,
    pub request_error: Mutex<Option<ProviderError>>,
    pub probe_error: Mutex<Option<ProviderError>>,
    /// The requested certificate shows up as issued on this list call (1-based)
    pub issued_on_list_call: Mutex<Option<usize>>,
}

impl Default for FakeAuthority {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            issued_arn: Mutex::new(CERT_ARN.to_string()),
            record: Mutex::new(None),
            describe_error: Mutex::new(None),
            delete_error: Mutex::new(None),
            request_error: Mutex::new(None),
            probe_error: Mutex::new(None),
            issued_on_list_call: Mutex::new(None),
        }
    }
}

impl FakeAuthority {
    pub fn with_record(arn: &str, status: CertificateStatus, domains: &[&str]) -> Self {
        let fake = Self::default();
        *fake.record.lock().unwrap() = Some(CertificateRecord {
            arn: arn.to_string(),
            status,
            domains: domains.iter().map(|d| (*d).to_string()).collect::<BTreeSet<_>>(),
        });
        fake
    }

    pub fn calls(&self) -> Vec<AuthorityCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<CertificateRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AuthorityCall::Request(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AuthorityCall::Delete(arn) => Some(arn),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, AuthorityCall::ListIssued))
            .count()
    }

    fn log_call(&self, call: AuthorityCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl CertificateAuthority for FakeAuthority {
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, ProviderError> {
        self.log_call(AuthorityCall::Request(request.clone()));
        if let Some(e) = self.request_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.issued_arn.lock().unwrap().clone())
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateRecord, ProviderError> {
        self.log_call(AuthorityCall::Describe(arn.to_string()));
        if let Some(e) = self.describe_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.record
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("DescribeCertificate", arn))
    }

    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        self.log_call(AuthorityCall::Delete(arn.to_string()));
        match self.delete_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn list_issued_certificates(&self) -> Result<Vec<CertificateSummary>, ProviderError> {
        self.log_call(AuthorityCall::ListIssued);
        let calls = self.list_calls();
        let issued = self
            .issued_on_list_call
            .lock()
            .unwrap()
            .is_some_and(|n| calls >= n);

        let mut summaries = vec![CertificateSummary {
            domain_name: "other.example".to_string(),
            arn: "arn:aws:acm:us-east-1:123456789012:certificate/other".to_string(),
        }];
        if issued {
            let requested = self.requests();
            let domain = requested
                .last()
                .map_or_else(|| "a.example".to_string(), |r| r.domain_name.clone());
            summaries.push(CertificateSummary {
                domain_name: domain,
                arn: self.issued_arn.lock().unwrap().clone(),
            });
        }
        Ok(summaries)
    }

    async fn probe_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        self.log_call(AuthorityCall::Probe(arn.to_string()));
        match self.probe_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// In-memory CDN configuration API with etag concurrency control.
pub struct FakeDistributions {
    pub config: Mutex<Value>,
    pub etag: Mutex<String>,
    pub updates: Mutex<Vec<Value>>,
    pub probe_error: Mutex<Option<ProviderError>>,
    /// Simulate a concurrent edit landing between read and write
    pub bump_etag_after_read: Mutex<bool>,
}

impl FakeDistributions {
    pub fn new(config: Value) -> Self {
        Self {
            config: Mutex::new(config),
            etag: Mutex::new("E1".to_string()),
            updates: Mutex::new(Vec::new()),
            probe_error: Mutex::new(None),
            bump_etag_after_read: Mutex::new(false),
        }
    }

    /// Distribution with a viewer certificate block served by `source`.
    pub fn serving(source: &str, certificate: &str) -> Self {
        Self::new(json!({
            "Comment": "site",
            "Enabled": true,
            "ViewerCertificate": {
                "CertificateSource": source,
                "Certificate": certificate,
                "MinimumProtocolVersion": "SSLv3",
                "SSLSupportMethod": "vip"
            }
        }))
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn current(&self) -> Value {
        self.config.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DistributionApi for FakeDistributions {
    type Config = Value;

    async fn get_distribution(&self, id: &str) -> Result<(), ProviderError> {
        match self.probe_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None if id == DISTRIBUTION_ID => Ok(()),
            None => Err(not_found("GetDistribution", id)),
        }
    }

    async fn get_distribution_config(
        &self,
        _id: &str,
    ) -> Result<DistributionSnapshot<Value>, ProviderError> {
        let snapshot = DistributionSnapshot {
            config: self.config.lock().unwrap().clone(),
            etag: self.etag.lock().unwrap().clone(),
        };
        if *self.bump_etag_after_read.lock().unwrap() {
            *self.etag.lock().unwrap() = "E-concurrent".to_string();
        }
        Ok(snapshot)
    }

    async fn update_distribution_config(
        &self,
        id: &str,
        etag: &str,
        config: Value,
    ) -> Result<String, ProviderError> {
        let mut current = self.etag.lock().unwrap();
        if *current != etag {
            return Err(ProviderError::new(
                "UpdateDistribution",
                id,
                Some(412),
                "The If-Match version is missing or not valid",
            ));
        }
        self.updates.lock().unwrap().push(config.clone());
        *self.config.lock().unwrap() = config;
        *current = format!("{current}-next");
        Ok(current.clone())
    }
}
