//! kubewardd: readiness gate and self-healing loop.
//!
//! # Usage
//!
//! ```text
//! kubewardd gate --source inventory            # exit 0 when all pods are ready
//! kubewardd gate --source prometheus --max-attempts 10
//! kubewardd heal --config /etc/kubeward.toml   # restart failed scrape jobs forever
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;

use kubeward_core::KubewardConfig;
use kubewardd::modes::{self, GateOverrides, HealOptions, SourceKind};

#[derive(Parser)]
#[command(
    name = "kubewardd",
    about = "Readiness gate and self-healing loop for a Kubernetes sandbox",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to kubeward.toml (defaults are used when omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Poll until every target is ready or the attempt budget runs out.
    ///
    /// Exits 0 on convergence and 1 on timeout or setup failure.
    Gate {
        /// Signal source to poll.
        #[arg(long, value_enum, default_value = "inventory")]
        source: SourceKind,

        /// Maximum number of samples before giving up.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Delay between samples (e.g. "15s").
        #[arg(long)]
        delay: Option<String>,

        /// Minimum targets that must be present to pass.
        #[arg(long)]
        min_targets: Option<usize>,
    },
    /// Restart failed scrape jobs forever and expose counters on /metrics.
    Heal {
        /// Time between checks (e.g. "60s").
        #[arg(long)]
        interval: Option<String>,

        /// Address for the metrics endpoint.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Detect and log only; never restart anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = format!("{e:#}"), "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = KubewardConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Gate {
            source,
            max_attempts,
            delay,
            min_targets,
        } => {
            let overrides = GateOverrides {
                max_attempts,
                delay,
                min_targets,
            };
            let outcome = modes::run_gate(source, &config, &overrides).await?;
            Ok(ExitCode::from(outcome.exit_code() as u8))
        }
        Command::Heal {
            interval,
            bind,
            dry_run,
        } => {
            let options = HealOptions {
                interval,
                bind,
                dry_run,
            };
            modes::run_heal(&config, &options).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,kubeward=debug,kubewardd=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
