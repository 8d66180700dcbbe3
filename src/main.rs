//! podcert: operator CLI for pod certification.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HttpGateway / NullGateway   TokioDelay   LogEventSink       │
//! │  (GatewayPort)               (DelayPort)  (EventSink)        │
//! │  JsonConfigFile (ConfigPort)                                 │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          CertService (pure orchestration)              │  │
//! │  │  Session · Catalog · Poll policy                       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs the selected tests one after another on a current-thread runtime,
//! prints the session, and optionally completes certification.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use podcert::adapters::config_file::JsonConfigFile;
use podcert::adapters::http_gateway::HttpGateway;
use podcert::adapters::log_sink::LogEventSink;
use podcert::adapters::null_gateway::NullGateway;
use podcert::adapters::time::TokioDelay;
use podcert::app::commands::CertCommand;
use podcert::app::ports::{ConfigPort, DelayPort, EventSink, GatewayPort};
use podcert::app::service::{CertService, CommandOutcome, RunOutcome};
use podcert::catalog::TestId;
use podcert::config::PollPolicy;
use podcert::session::PodId;

#[derive(Debug, Parser)]
#[command(name = "podcert", version, about = "Run certification tests on a locker pod")]
struct Cli {
    /// Pod identifier (also the messaging topic).
    pod_id: String,

    /// Test to run; repeat for several.  Defaults to every test.
    #[arg(short, long = "test", value_name = "KEY")]
    tests: Vec<TestId>,

    /// Complete certification when every test has passed.
    #[arg(long)]
    certify: bool,

    /// JSON config file.
    #[arg(short, long, env = "PODCERT_CONFIG", default_value = "podcert.json")]
    config: PathBuf,

    /// Gateway base URL (normalised to its origin).
    #[arg(long, env = "PODCERT_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token for the gateway.
    #[arg(long, env = "PODCERT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Use bounded exponential-backoff polling instead of a single read.
    #[arg(long)]
    backoff: bool,

    /// Do not contact the gateway; remote tests fail immediately.
    #[arg(long)]
    offline: bool,

    /// Print the final session as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default)]
struct Summary {
    failed: usize,
    certify_rejected: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()).await {
        Ok(summary) if summary.failed == 0 && !summary.certify_rejected => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<Summary> {
    info!("podcert v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Config ─────────────────────────────────────────────
    let mut config = JsonConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.base_url.is_some() {
        config.gateway.base_url.clone_from(&cli.base_url);
    }
    if cli.backoff && config.poll == PollPolicy::SingleShot {
        config.poll = PollPolicy::default_backoff();
    }
    config.validate().context("invalid configuration")?;

    // ── 2. Session ────────────────────────────────────────────
    let pod = PodId::new(&cli.pod_id).context("invalid pod id")?;
    let tests = if cli.tests.is_empty() {
        TestId::ALL.to_vec()
    } else {
        cli.tests.clone()
    };

    // ── 3. Adapters + run ─────────────────────────────────────
    let delay = TokioDelay::new();
    let mut sink = LogEventSink::new();

    if cli.offline {
        warn!("Offline: remote tests will fail without contacting the gateway");
        let service = CertService::new(config, pod);
        return Ok(drive(&service, &tests, &cli, &NullGateway, &delay, &mut sink).await);
    }

    if cli.token.is_none() {
        warn!("No bearer token supplied; the gateway may reject requests");
    }
    let gateway = HttpGateway::new(config.gateway.clone(), cli.token.clone())
        .context("building HTTP client")?;
    info!("Gateway: {}", config.gateway.podcore_url());
    let service = CertService::new(config, pod);
    Ok(drive(&service, &tests, &cli, &gateway, &delay, &mut sink).await)
}

async fn drive(
    service: &CertService,
    tests: &[TestId],
    cli: &Cli,
    gateway: &impl GatewayPort,
    delay: &impl DelayPort,
    sink: &mut impl EventSink,
) -> Summary {
    let mut summary = Summary::default();

    for id in tests {
        let outcome = service
            .handle_command(CertCommand::RunTest(*id), gateway, delay, sink)
            .await;
        if matches!(outcome, CommandOutcome::Ran(RunOutcome::Failed { .. })) {
            summary.failed += 1;
        }
    }

    print_session(service, cli.json);

    if cli.certify {
        match service
            .handle_command(CertCommand::Certify, gateway, delay, sink)
            .await
        {
            CommandOutcome::Certified => println!("Pod {} certified.", cli.pod_id.trim()),
            _ => summary.certify_rejected = true,
        }
    }

    summary
}

fn print_session(service: &CertService, json: bool) {
    let snapshot = service.snapshot();
    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!("snapshot serialisation failed: {e}"),
        }
    } else {
        print!("{snapshot}");
    }
}
