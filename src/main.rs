//! HTTP Timeout Scenario Harness
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                        ScenarioRunner                            │
//!   │                                                                  │
//!   │  ScenarioSpec ──▶ ProfileRegistry ──▶ EndpointGateway ──────────┼──▶ endpoint
//!   │      list          (lazy clients)     (routes, budgets)          │
//!   │                                             │                    │
//!   │                                             ▼                    │
//!   │                                    rate-controlled transfer      │
//!   │                                             │                    │
//!   │                                             ▼                    │
//!   │  ResultSink ◀── Verdict ◀──────────── outcome::classify          │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use timeout_harness::config::{load_or_default, revalidate};
use timeout_harness::lifecycle::Shutdown;
use timeout_harness::observability::{logging, metrics, ResultSink, StdoutSink, TracingSink};
use timeout_harness::{ProfileRegistry, ScenarioRunner};

#[derive(Parser)]
#[command(name = "timeout-harness")]
#[command(about = "Reproduce and verify client/server HTTP timeout scenarios", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario list against the endpoint
    Run {
        /// Override the endpoint base URL
        #[arg(short, long)]
        base_url: Option<String>,

        /// Run only these scenario ids (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Print the run report as JSON instead of verdict lines
        #[arg(long)]
        json: bool,
    },
    /// List the scenarios that would run
    Scenarios,
    /// List client profiles and their budgets
    Profiles,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);

    match cli.command {
        Commands::Run { base_url, only, json } => {
            if let Some(base_url) = base_url {
                config.target.base_url = base_url;
            }
            if !only.is_empty() {
                config.run.only = only;
            }
            revalidate(&config)?;

            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr)?,
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let shutdown = Arc::new(Shutdown::new());
            let sink: Arc<dyn ResultSink> = if json {
                Arc::new(TracingSink)
            } else {
                Arc::new(StdoutSink)
            };
            let runner = ScenarioRunner::from_config(&config)?
                .with_sink(sink)
                .with_shutdown(shutdown.subscribe());

            let ctrl_c = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling run");
                    ctrl_c.trigger();
                }
            });

            let report = runner.run().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }

            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Scenarios => {
            for spec in config.scenario_list() {
                let delay = spec
                    .effective_delay()
                    .map(|d| format!("{}ms", d.as_millis()))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<22} {:<12} {:<42} delay={:<8} expect={:<18} {}",
                    spec.id,
                    spec.profile,
                    spec.route.path(),
                    delay,
                    spec.expected,
                    spec.description
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Profiles => {
            let registry = ProfileRegistry::new(config.client_profiles())?;
            for profile in registry.profiles() {
                println!(
                    "{:<12} connect={:?} read={:?} write={:?}",
                    profile.name, profile.budget.connect, profile.budget.read, profile.budget.write
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
