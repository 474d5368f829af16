// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every option can also be set through a `CERTBINDER_*` environment variable, which is
//! how the container image is normally configured.

use crate::constants::{
    CALLBACK_TIMEOUT_SECS, DEFAULT_INVOCATION_TIMEOUT_SECS, DEFAULT_LISTEN_ADDR,
    ISSUANCE_POLL_INTERVAL_SECS, ISSUANCE_SAFETY_MARGIN_SECS, MAX_DURATION_SECS,
    MIN_POLL_INTERVAL_SECS,
};
use crate::reconcilers::{AwaitStrategy, IssuancePolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Custom resource reconcilers for ACM certificates and CloudFront bindings.
#[derive(Debug, Parser)]
#[command(name = "certbinder", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Accept events over HTTP and answer them asynchronously
    Serve(ServeArgs),
    /// Handle a single event and print the response envelope
    Invoke(InvokeArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "CERTBINDER_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[command(flatten)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Args)]
pub struct InvokeArgs {
    /// Which reconciler handles the event
    #[arg(long, value_enum)]
    pub kind: ResourceKind,

    /// Event JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub event: PathBuf,

    /// Print the envelope without PUTting it to the event's ResponseURL
    #[arg(long)]
    pub no_callback: bool,

    #[command(flatten)]
    pub reconcile: ReconcileConfig,
}

/// Settings shared by every invocation.
#[derive(Debug, Clone, Args)]
pub struct ReconcileConfig {
    /// Wall-clock budget of one invocation, in seconds
    #[arg(
        long,
        env = "CERTBINDER_INVOCATION_TIMEOUT_SECS",
        default_value_t = DEFAULT_INVOCATION_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_DURATION_SECS)
    )]
    pub invocation_timeout_secs: u64,

    /// Sleep between issuance checks, in seconds
    #[arg(
        long,
        env = "CERTBINDER_POLL_INTERVAL_SECS",
        default_value_t = ISSUANCE_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(MIN_POLL_INTERVAL_SECS..=MAX_DURATION_SECS)
    )]
    pub poll_interval_secs: u64,

    /// Time kept in reserve before the invocation deadline, in seconds
    #[arg(
        long,
        env = "CERTBINDER_SAFETY_MARGIN_SECS",
        default_value_t = ISSUANCE_SAFETY_MARGIN_SECS,
        value_parser = clap::value_parser!(u64).range(0..=MAX_DURATION_SECS)
    )]
    pub safety_margin_secs: u64,

    /// How to wait when a certificate declares `Await`
    #[arg(
        long,
        env = "CERTBINDER_AWAIT_STRATEGY",
        value_enum,
        default_value_t = AwaitStrategy::Block
    )]
    pub await_strategy: AwaitStrategy,

    /// Timeout of the response envelope PUT, in seconds
    #[arg(
        long,
        env = "CERTBINDER_CALLBACK_TIMEOUT_SECS",
        default_value_t = CALLBACK_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_DURATION_SECS)
    )]
    pub callback_timeout_secs: u64,

    /// Region for ACM calls; defaults to the ambient AWS region
    #[arg(long, env = "CERTBINDER_ACM_REGION")]
    pub acm_region: Option<String>,
}

impl ReconcileConfig {
    #[must_use]
    pub fn invocation_budget(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }

    #[must_use]
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    #[must_use]
    pub fn issuance_policy(&self) -> IssuancePolicy {
        IssuancePolicy {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            safety_margin: Duration::from_secs(self.safety_margin_secs),
            strategy: self.await_strategy,
        }
    }
}

/// Resource kinds handled by this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    /// ACM certificate
    Certificate,
    /// Certificate bound to a CloudFront distribution
    Binding,
}

