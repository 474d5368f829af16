// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the provider contracts in `providers/mod.rs`

#[cfg(test)]
mod tests {
    use super::super::{CertificateStatus, ViewerCertificate, ViewerCertificateConfig};
    use serde_json::{json, Value};

    const ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/abc";

    #[test]
    fn test_certificate_status_from_wire() {
        assert_eq!(
            CertificateStatus::from_wire("PENDING_VALIDATION"),
            CertificateStatus::PendingValidation
        );
        assert_eq!(CertificateStatus::from_wire("ISSUED"), CertificateStatus::Issued);
        assert_eq!(
            CertificateStatus::from_wire("SOMETHING_NEW"),
            CertificateStatus::Other("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn test_acm_viewer_certificate_uses_fixed_policy() {
        let certificate = ViewerCertificate::acm(ARN);

        assert!(certificate.is_acm());
        assert_eq!(certificate.certificate.as_deref(), Some(ARN));
        assert_eq!(certificate.minimum_protocol_version.as_deref(), Some("TLSv1"));
        assert_eq!(certificate.ssl_support_method.as_deref(), Some("sni-only"));
    }

    #[test]
    fn test_json_config_without_viewer_certificate() {
        let config = json!({"Enabled": true});
        assert_eq!(config.viewer_certificate(), None);
    }

    #[test]
    fn test_json_config_reads_legacy_certificate_field() {
        let config = json!({
            "ViewerCertificate": {
                "Certificate": ARN,
                "CertificateSource": "acm"
            }
        });

        let certificate = config.viewer_certificate().unwrap();
        assert!(certificate.is_acm());
        assert_eq!(certificate.certificate.as_deref(), Some(ARN));
        assert_eq!(certificate.ssl_support_method, None);
    }

    #[test]
    fn test_json_config_set_preserves_other_fields() {
        let mut config = json!({
            "Enabled": true,
            "Origins": {"Quantity": 1},
            "ViewerCertificate": {"CloudFrontDefaultCertificate": true}
        });

        config.set_viewer_certificate(&ViewerCertificate::acm(ARN));

        assert_eq!(config["Enabled"], true);
        assert_eq!(config["Origins"]["Quantity"], 1);
        assert_eq!(config["ViewerCertificate"]["ACMCertificateArn"], ARN);
        assert_eq!(config["ViewerCertificate"]["CertificateSource"], "acm");
        assert_eq!(
            config.viewer_certificate(),
            Some(ViewerCertificate::acm(ARN))
        );
    }

    #[test]
    fn test_json_config_set_on_non_object() {
        let mut config = Value::Null;
        config.set_viewer_certificate(&ViewerCertificate::acm(ARN));
        assert_eq!(config.viewer_certificate(), Some(ViewerCertificate::acm(ARN)));
    }

    // ============================================================================
    // CloudFront SDK configuration
    // ============================================================================

    mod cloudfront_config {
        use super::ARN;
        use crate::providers::{ViewerCertificate, ViewerCertificateConfig};
        use crate::reconcilers::{classify_binding, BindingState};
        use aws_sdk_cloudfront::types::{
            CertificateSource, DefaultCacheBehavior, DistributionConfig, Origins,
            SslSupportMethod, ViewerCertificate as CfViewerCertificate, ViewerProtocolPolicy,
        };

        fn distribution_config(viewer: Option<CfViewerCertificate>) -> DistributionConfig {
            DistributionConfig::builder()
                .caller_reference("site")
                .origins(
                    Origins::builder()
                        .quantity(0)
                        .set_items(Some(Vec::new()))
                        .build()
                        .unwrap(),
                )
                .default_cache_behavior(
                    DefaultCacheBehavior::builder()
                        .target_origin_id("origin")
                        .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
                        .build()
                        .unwrap(),
                )
                .comment("site")
                .enabled(true)
                .set_viewer_certificate(viewer)
                .build()
                .unwrap()
        }

        #[test]
        fn test_acm_arn_without_certificate_source_is_already_bound() {
            let config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .acm_certificate_arn(ARN)
                    .ssl_support_method(SslSupportMethod::SniOnly)
                    .build(),
            ));

            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert!(current.is_acm());
            assert_eq!(current.certificate.as_deref(), Some(ARN));
            assert_eq!(
                classify_binding(Some(&current), ARN),
                BindingState::AlreadyBound
            );
        }

        #[test]
        fn test_acm_arn_without_certificate_source_for_other_certificate_is_rebind() {
            let config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .acm_certificate_arn("arn:aws:acm:us-east-1:123456789012:certificate/old")
                    .build(),
            ));

            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert_eq!(
                classify_binding(Some(&current), ARN),
                BindingState::Rebind { from_acm: true }
            );
        }

        #[test]
        fn test_default_certificate_source_is_inferred() {
            let config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .cloud_front_default_certificate(true)
                    .build(),
            ));

            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert_eq!(current.certificate_source.as_deref(), Some("cloudfront"));
            assert_eq!(current.certificate, None);
            assert_eq!(
                classify_binding(Some(&current), ARN),
                BindingState::Rebind { from_acm: false }
            );
        }

        #[test]
        fn test_iam_certificate_source_is_inferred() {
            let config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .iam_certificate_id("ASCAEXAMPLE")
                    .build(),
            ));

            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert_eq!(current.certificate_source.as_deref(), Some("iam"));
            assert_eq!(current.certificate.as_deref(), Some("ASCAEXAMPLE"));
            assert!(!current.is_acm());
        }

        #[test]
        fn test_deprecated_certificate_source_used_as_fallback() {
            let config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .certificate_source(CertificateSource::Acm)
                    .build(),
            ));

            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert!(current.is_acm());
            assert_eq!(current.certificate, None);
        }

        #[test]
        fn test_missing_viewer_certificate_block() {
            let config = distribution_config(None);
            assert_eq!(ViewerCertificateConfig::viewer_certificate(&config), None);
            assert_eq!(classify_binding(None, ARN), BindingState::Unset);
        }

        #[test]
        fn test_rewrite_replaces_default_certificate_block() {
            let mut config = distribution_config(Some(
                CfViewerCertificate::builder()
                    .cloud_front_default_certificate(true)
                    .build(),
            ));

            config.set_viewer_certificate(&ViewerCertificate::acm(ARN));

            let block = config.viewer_certificate.as_ref().unwrap();
            assert_eq!(block.acm_certificate_arn(), Some(ARN));
            assert_eq!(block.ssl_support_method(), Some(&SslSupportMethod::SniOnly));
            assert_eq!(
                block.minimum_protocol_version().map(|version| version.as_str()),
                Some("TLSv1")
            );
            assert_ne!(block.cloud_front_default_certificate(), Some(true));
            assert_eq!(config.comment(), "site");
            assert_eq!(config.caller_reference(), "site");

            // A re-read after the rewrite is a no-op for the same certificate
            let current = ViewerCertificateConfig::viewer_certificate(&config).unwrap();
            assert_eq!(
                classify_binding(Some(&current), ARN),
                BindingState::AlreadyBound
            );
        }
    }

    #[test]
    fn test_json_config_infers_source_from_certificate_fields() {
        let config = json!({"ViewerCertificate": {"ACMCertificateArn": ARN}});
        let certificate = config.viewer_certificate().unwrap();
        assert!(certificate.is_acm());
        assert_eq!(certificate.certificate.as_deref(), Some(ARN));

        let config = json!({"ViewerCertificate": {"CloudFrontDefaultCertificate": true}});
        let certificate = config.viewer_certificate().unwrap();
        assert_eq!(certificate.certificate_source.as_deref(), Some("cloudfront"));
    }
}
