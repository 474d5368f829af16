// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use certbinder::{
    callback::CallbackClient,
    config::{Cli, Command, InvokeArgs, ReconcileConfig, ResourceKind, ServeArgs},
    dispatch::Dispatcher,
    providers::{acm::AcmCertificateAuthority, cloudfront::CloudFrontDistributions},
    reconcilers::{CertificateReconciler, DistributionBinder, Reconciler},
    request::{CustomResourceEvent, ResultStatus},
    server::{self, AppState},
};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("certbinder")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    // Respects RUST_LOG (default INFO) and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    // Logs go to stderr so `invoke` can print the envelope on stdout
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!("Logging initialized with file and line number tracking");

    match cli.command {
        Command::Serve(args) => run_server(args).await.map(|()| ExitCode::SUCCESS),
        Command::Invoke(args) => run_invoke(args).await,
    }
}

/// Reconcilers wired to the AWS SDK adapters.
struct Reconcilers {
    certificates: Arc<dyn Reconciler>,
    bindings: Arc<dyn Reconciler>,
}

async fn build_reconcilers(config: &ReconcileConfig) -> Reconcilers {
    debug!("Loading AWS configuration");
    let shared = aws_config::load_from_env().await;

    let authority = Arc::new(AcmCertificateAuthority::from_conf(
        &shared,
        config.acm_region.clone(),
    ));
    let distributions = Arc::new(CloudFrontDistributions::from_conf(&shared));

    Reconcilers {
        certificates: Arc::new(CertificateReconciler::new(
            Arc::clone(&authority),
            config.issuance_policy(),
        )),
        bindings: Arc::new(DistributionBinder::new(authority, distributions)),
    }
}

fn dispatcher(config: &ReconcileConfig) -> Result<Dispatcher> {
    let callback = CallbackClient::new(config.callback_timeout())
        .context("Failed to build callback HTTP client")?;
    Ok(Dispatcher::new(callback, config.invocation_budget()))
}

async fn run_server(args: ServeArgs) -> Result<()> {
    info!(
        listen_addr = %args.listen_addr,
        await_strategy = ?args.reconcile.await_strategy,
        invocation_timeout_secs = args.reconcile.invocation_timeout_secs,
        "Starting certbinder server"
    );

    let reconcilers = build_reconcilers(&args.reconcile).await;
    let state = AppState {
        dispatcher: dispatcher(&args.reconcile)?,
        certificates: reconcilers.certificates,
        bindings: reconcilers.bindings,
    };

    let listener = tokio::net::TcpListener::bind(args.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen_addr))?;

    server::serve(listener, state, server::shutdown_signal()).await
}

async fn run_invoke(args: InvokeArgs) -> Result<ExitCode> {
    let event = CustomResourceEvent::read_from(&args.event).await?;

    let reconcilers = build_reconcilers(&args.reconcile).await;
    let reconciler = match args.kind {
        ResourceKind::Certificate => reconcilers.certificates,
        ResourceKind::Binding => reconcilers.bindings,
    };
    let dispatcher = dispatcher(&args.reconcile)?;

    let envelope = if args.no_callback {
        dispatcher.respond(reconciler.as_ref(), &event).await
    } else {
        dispatcher.handle(reconciler.as_ref(), &event).await
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if envelope.status == ResultStatus::Success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
