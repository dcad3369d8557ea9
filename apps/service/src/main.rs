use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use netpulse::database::partition;
use netpulse::{AppContext, Config, shutdown};

/// Probe a host every minute and keep a daily record of the results
#[derive(Debug, Parser)]
#[command(name = "netpulse-service", version, about)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/netpulse/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the probe scheduler until interrupted
    Run,
    /// Probe the target once and print the measurement, without storing it
    Probe,
    /// Print the measurements of a day
    Show {
        /// Day as YYYY-MM-DD, today when omitted
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Print the statistics of a day
    Stats {
        /// Day as YYYY-MM-DD, today when omitted
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Delete partitions older than the retention period
    Sweep,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logger::init_tracing_with(if cli.verbose { logger::LevelFilter::DEBUG } else { logger::LevelFilter::INFO });

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let context = AppContext::from_config(config).context("Failed to open record store")?;
    let query = context.query();

    match cli.command {
        Command::Run => {
            let scheduler = context.scheduler();
            let handle = scheduler.clone().spawn();

            shutdown::shutdown_signal().await;
            scheduler.shutdown();
            handle.await.context("Scheduler task panicked")?;
        }
        Command::Probe => {
            let measurement = context.executor().probe(&context.config().probe.target).await;
            println!("{}", serde_json::to_string_pretty(&measurement)?);
        }
        Command::Show { date } => {
            let date = resolve_date(date.as_deref(), || query.current_date())?;
            println!("{}", serde_json::to_string_pretty(&query.day(date).await)?);
        }
        Command::Stats { date } => {
            let date = resolve_date(date.as_deref(), || query.current_date())?;
            println!("{}", serde_json::to_string_pretty(&query.day_stats(date).await)?);
        }
        Command::Sweep => {
            let report = context.retention().cleanup_expired().await?;
            info!("Removed {} partition(s)", report.removed.len());
            for (date, reason) in &report.failed {
                eprintln!("{date}: {reason}");
            }
        }
        Command::Config => print!("{}", context.config()),
    }

    Ok(())
}

fn resolve_date(
    raw: Option<&str>,
    today: impl FnOnce() -> chrono::NaiveDate,
) -> Result<chrono::NaiveDate> {
    match raw {
        Some(raw) => partition::parse_date(raw)
            .with_context(|| format!("Invalid date '{raw}', expected YYYY-MM-DD")),
        None => Ok(today()),
    }
}
