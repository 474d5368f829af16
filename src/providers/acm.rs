// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS Certificate Manager adapter.
//!
//! Implements [`CertificateAuthority`] on top of `aws-sdk-acm`. SDK failures are flattened
//! into [`ProviderError`] with the HTTP status preserved for classification.

use super::{
    CertificateAuthority, CertificateRecord, CertificateRequest, CertificateStatus,
    CertificateSummary,
};
use crate::errors::ProviderError;
use aws_sdk_acm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_acm::types::{CertificateStatus as AcmCertificateStatus, DomainValidationOption};
use aws_sdk_acm::Client;
use std::collections::BTreeSet;
use tracing::debug;

/// Convert an SDK failure into a [`ProviderError`].
fn provider_error<E>(operation: &'static str, resource_id: &str, err: &SdkError<E>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());
    let message = match err.as_service_error() {
        Some(service_err) => format!(
            "{}: {}",
            service_err.code().unwrap_or("Unknown"),
            service_err.message().unwrap_or("no message")
        ),
        None => DisplayErrorContext(err).to_string(),
    };
    ProviderError::new(operation, resource_id, status, message)
}

/// [`CertificateAuthority`] backed by AWS Certificate Manager.
#[derive(Debug, Clone)]
pub struct AcmCertificateAuthority {
    client: Client,
}

impl AcmCertificateAuthority {
    /// Wrap an existing ACM client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build an adapter from shared AWS configuration, optionally pinned to a region.
    ///
    /// Certificates used by CloudFront must live in `us-east-1`, so deployments running
    /// elsewhere pass an explicit region.
    #[must_use]
    pub fn from_conf(shared: &aws_config::SdkConfig, region: Option<String>) -> Self {
        let mut builder = aws_sdk_acm::config::Builder::from(shared);
        if let Some(region) = region {
            builder = builder.region(aws_sdk_acm::config::Region::new(region));
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait::async_trait]
impl CertificateAuthority for AcmCertificateAuthority {
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, ProviderError> {
        const OPERATION: &str = "RequestCertificate";

        let mut call = self
            .client
            .request_certificate()
            .domain_name(&request.domain_name)
            .idempotency_token(&request.idempotency_token);

        if !request.subject_alternative_names.is_empty() {
            call = call.set_subject_alternative_names(Some(
                request.subject_alternative_names.clone(),
            ));
        }

        if !request.validation_options.is_empty() {
            let options = request
                .validation_options
                .iter()
                .map(|option| {
                    DomainValidationOption::builder()
                        .domain_name(&option.domain_name)
                        .validation_domain(&option.validation_domain)
                        .build()
                        .map_err(|e| {
                            ProviderError::new(OPERATION, &option.domain_name, None, e.to_string())
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            call = call.set_domain_validation_options(Some(options));
        }

        let output = call
            .send()
            .await
            .map_err(|e| provider_error(OPERATION, &request.domain_name, &e))?;

        output.certificate_arn.ok_or_else(|| {
            ProviderError::new(
                OPERATION,
                &request.domain_name,
                None,
                "response did not include a certificate ARN",
            )
        })
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateRecord, ProviderError> {
        const OPERATION: &str = "DescribeCertificate";

        let output = self
            .client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| provider_error(OPERATION, arn, &e))?;

        let detail = output.certificate.ok_or_else(|| {
            ProviderError::new(OPERATION, arn, None, "response did not include a certificate")
        })?;

        let mut domains: BTreeSet<String> = detail
            .subject_alternative_names
            .unwrap_or_default()
            .into_iter()
            .collect();
        if let Some(primary) = detail.domain_name {
            domains.insert(primary);
        }

        let status = detail
            .status
            .as_ref()
            .map_or(CertificateStatus::Other(String::new()), |s: &AcmCertificateStatus| {
                CertificateStatus::from_wire(s.as_str())
            });

        Ok(CertificateRecord {
            arn: detail.certificate_arn.unwrap_or_else(|| arn.to_string()),
            status,
            domains,
        })
    }

    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        self.client
            .delete_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| provider_error("DeleteCertificate", arn, &e))?;
        Ok(())
    }

    async fn list_issued_certificates(&self) -> Result<Vec<CertificateSummary>, ProviderError> {
        const OPERATION: &str = "ListCertificates";

        let mut summaries = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_certificates()
                .certificate_statuses(AcmCertificateStatus::Issued)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| provider_error(OPERATION, "ISSUED", &e))?;

            summaries.extend(
                output
                    .certificate_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|summary| {
                        Some(CertificateSummary {
                            domain_name: summary.domain_name?,
                            arn: summary.certificate_arn?,
                        })
                    }),
            );

            match output.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(count = summaries.len(), "Listed issued certificates");
        Ok(summaries)
    }

    async fn probe_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        // GetCertificate rejects certificates that are still pending validation, so the
        // probe describes the certificate instead.
        self.client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| provider_error("DescribeCertificate", arn, &e))?;
        Ok(())
    }
}
