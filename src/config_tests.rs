// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::{Cli, Command, ResourceKind};
    use crate::reconcilers::AwaitStrategy;
    use clap::{CommandFactory, Parser};
    use std::time::Duration;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_invoke_defaults() {
        let cli = Cli::try_parse_from(["certbinder", "invoke", "--kind", "certificate"]).unwrap();

        let Command::Invoke(args) = cli.command else {
            panic!("expected invoke");
        };
        assert_eq!(args.kind, ResourceKind::Certificate);
        assert_eq!(args.event.to_str(), Some("-"));
        assert!(!args.no_callback);

        let policy = args.reconcile.issuance_policy();
        assert_eq!(policy.poll_interval, Duration::from_secs(5));
        assert_eq!(policy.safety_margin, Duration::from_secs(10));
        assert_eq!(policy.strategy, AwaitStrategy::Block);
        assert_eq!(args.reconcile.invocation_budget(), Duration::from_secs(300));
        assert_eq!(args.reconcile.acm_region, None);
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "certbinder",
            "serve",
            "--listen-addr",
            "127.0.0.1:9000",
            "--await-strategy",
            "defer",
            "--invocation-timeout-secs",
            "900",
            "--acm-region",
            "us-east-1",
        ])
        .unwrap();

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.listen_addr.port(), 9000);
        assert_eq!(args.reconcile.await_strategy, AwaitStrategy::Defer);
        assert_eq!(args.reconcile.invocation_budget(), Duration::from_secs(900));
        assert_eq!(args.reconcile.acm_region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_invoke_requires_kind() {
        assert!(Cli::try_parse_from(["certbinder", "invoke"]).is_err());
        assert!(Cli::try_parse_from(["certbinder", "invoke", "--kind", "dns"]).is_err());
    }

    #[test]
    fn test_durations_are_range_checked() {
        for (flag, value) in [
            ("--poll-interval-secs", "0"),
            ("--invocation-timeout-secs", "0"),
            ("--invocation-timeout-secs", "18446744073709551615"),
            ("--safety-margin-secs", "86401"),
            ("--callback-timeout-secs", "0"),
        ] {
            let parsed =
                Cli::try_parse_from(["certbinder", "invoke", "--kind", "binding", flag, value]);
            assert!(parsed.is_err(), "{flag}={value} should be rejected");
        }

        let cli = Cli::try_parse_from([
            "certbinder",
            "invoke",
            "--kind",
            "binding",
            "--safety-margin-secs",
            "0",
            "--invocation-timeout-secs",
            "86400",
        ])
        .unwrap();
        let Command::Invoke(args) = cli.command else {
            panic!("expected invoke");
        };
        assert_eq!(args.reconcile.issuance_policy().safety_margin, Duration::ZERO);
        assert_eq!(args.reconcile.invocation_budget(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_default_callback_timeout_fits_in_safety_margin() {
        let cli = Cli::try_parse_from(["certbinder", "invoke", "--kind", "certificate"]).unwrap();
        let Command::Invoke(args) = cli.command else {
            panic!("expected invoke");
        };
        assert!(args.reconcile.callback_timeout() <= args.reconcile.issuance_policy().safety_margin);
    }
}
