// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Amazon CloudFront adapter.
//!
//! Implements [`DistributionApi`] on top of `aws-sdk-cloudfront`, using the SDK's typed
//! `DistributionConfig` as the opaque configuration document.

use super::{DistributionApi, DistributionSnapshot, ViewerCertificate, ViewerCertificateConfig};
use crate::constants::{
    CERTIFICATE_SOURCE_ACM, CERTIFICATE_SOURCE_CLOUDFRONT, CERTIFICATE_SOURCE_IAM,
};
use crate::errors::ProviderError;
use aws_sdk_cloudfront::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudfront::types::{
    CertificateSource, DistributionConfig, MinimumProtocolVersion, SslSupportMethod,
    ViewerCertificate as CfViewerCertificate,
};
use aws_sdk_cloudfront::Client;
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

/// Source of a viewer certificate block.
///
/// CloudFront no longer populates the deprecated `CertificateSource` field reliably, so
/// the source is taken from whichever certificate field is set and the deprecated field
/// is only consulted when none is.
fn certificate_source(block: &CfViewerCertificate) -> Option<String> {
    if block.acm_certificate_arn.is_some() {
        Some(CERTIFICATE_SOURCE_ACM.to_string())
    } else if block.iam_certificate_id.is_some() {
        Some(CERTIFICATE_SOURCE_IAM.to_string())
    } else if block.cloud_front_default_certificate == Some(true) {
        Some(CERTIFICATE_SOURCE_CLOUDFRONT.to_string())
    } else {
        block
            .certificate_source
            .as_ref()
            .map(|source| source.as_str().to_string())
    }
}

impl ViewerCertificateConfig for DistributionConfig {
    fn viewer_certificate(&self) -> Option<ViewerCertificate> {
        let block = self.viewer_certificate.as_ref()?;

        let certificate = block
            .acm_certificate_arn
            .clone()
            .or_else(|| block.iam_certificate_id.clone());

        Some(ViewerCertificate {
            certificate_source: certificate_source(block),
            certificate,
            minimum_protocol_version: block
                .minimum_protocol_version
                .as_ref()
                .map(|version| version.as_str().to_string()),
            ssl_support_method: block
                .ssl_support_method
                .as_ref()
                .map(|method| method.as_str().to_string()),
        })
    }

    fn set_viewer_certificate(&mut self, certificate: &ViewerCertificate) {
        let block = CfViewerCertificate::builder()
            .set_acm_certificate_arn(certificate.certificate.clone())
            .set_certificate_source(
                certificate
                    .certificate_source
                    .as_deref()
                    .map(CertificateSource::from),
            )
            .set_minimum_protocol_version(
                certificate
                    .minimum_protocol_version
                    .as_deref()
                    .map(MinimumProtocolVersion::from),
            )
            .set_ssl_support_method(
                certificate
                    .ssl_support_method
                    .as_deref()
                    .map(SslSupportMethod::from),
            )
            .build();
        self.viewer_certificate = Some(block);
    }
}

/// [`DistributionApi`] backed by Amazon CloudFront.
#[derive(Debug, Clone)]
pub struct CloudFrontDistributions {
    client: Client,
}

impl CloudFrontDistributions {
    /// Wrap an existing CloudFront client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build an adapter from shared AWS configuration.
    #[must_use]
    pub fn from_conf(shared: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(shared))
    }
}

#[async_trait::async_trait]
impl DistributionApi for CloudFrontDistributions {
    type Config = DistributionConfig;

    async fn get_distribution(&self, id: &str) -> Result<(), ProviderError> {
        self.client
            .get_distribution()
            .id(id)
            .send()
            .await
            .map_err(|e| provider_error("GetDistribution", id, &e))?;
        Ok(())
    }

    async fn get_distribution_config(
        &self,
        id: &str,
    ) -> Result<DistributionSnapshot<Self::Config>, ProviderError> {
        const OPERATION: &str = "GetDistributionConfig";

        let output = self
            .client
            .get_distribution_config()
            .id(id)
            .send()
            .await
            .map_err(|e| provider_error(OPERATION, id, &e))?;

        let etag = output.e_tag.ok_or_else(|| {
            ProviderError::new(OPERATION, id, None, "response did not include an ETag")
        })?;
        let config = output.distribution_config.ok_or_else(|| {
            ProviderError::new(OPERATION, id, None, "response did not include a configuration")
        })?;

        debug!(distribution = id, etag = %etag, "Read distribution configuration");
        Ok(DistributionSnapshot { config, etag })
    }

    async fn update_distribution_config(
        &self,
        id: &str,
        etag: &str,
        config: Self::Config,
    ) -> Result<String, ProviderError> {
        let output = self
            .client
            .update_distribution()
            .id(id)
            .if_match(etag)
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| provider_error("UpdateDistribution", id, &e))?;

        Ok(output.e_tag.unwrap_or_default())
    }
}
