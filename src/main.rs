use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use epayment_worker::{CliConfig, FileConfig, WorkerConfig, ORACLE_CONNECTION};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Connection string for the OracleDb database (ADO style).
    #[clap(long)]
    connection_string: Option<String>,

    /// Seconds to wait between iterations.
    #[clap(long)]
    interval_secs: Option<u64>,

    /// Cron expression driving the trigger instead of a fixed interval,
    /// e.g. "0 * * * * *" for every minute.
    #[clap(long)]
    cron: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let file = match &args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli = CliConfig {
        connection_string: args.connection_string,
        interval_secs: args.interval_secs,
        cron: args.cron,
    };
    let config = WorkerConfig::resolve(&cli, file);
    let connection_string = config.connection_string(ORACLE_CONNECTION)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    run_worker(&config, connection_string, cancel).await
}

#[cfg(feature = "oracle-db")]
async fn run_worker(
    config: &WorkerConfig,
    connection_string: &str,
    cancel: CancellationToken,
) -> Result<()> {
    use anyhow::Context;
    use epayment_worker::oracle_db::OracleDatabase;
    use epayment_worker::{CronTrigger, IntervalTrigger, JobRunner, TriggerConfig};
    use std::sync::Arc;

    let database = Arc::new(OracleDatabase::from_connection_string(connection_string)?);
    let mut runner = JobRunner::new(database, config.payment.clone(), config.style);
    match &config.trigger {
        TriggerConfig::Interval(period) => {
            runner.run(IntervalTrigger::new(*period), cancel).await;
        }
        TriggerConfig::Cron(expr) => {
            let trigger = CronTrigger::new(expr).context("invalid cron trigger")?;
            runner.run(trigger, cancel).await;
        }
    }
    Ok(())
}

#[cfg(not(feature = "oracle-db"))]
async fn run_worker(
    _config: &WorkerConfig,
    _connection_string: &str,
    _cancel: CancellationToken,
) -> Result<()> {
    anyhow::bail!("built without a database driver; rebuild with `--features oracle-db`")
}
