use crate::{
    error::CliError,
    events::read_events,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::sql::postgres::store::PgStore;
use engine_config::sink::{PipelineVariant, SinkConfig};
use engine_core::{
    metrics::{Metrics, MetricsSnapshot},
    sink::write_mode::prepare,
};
use engine_processing::{
    error::PipelineError,
    pipeline::{DirectPipeline, StagedPipeline},
    retry::postgres_retry,
};
use futures_util::{Stream, StreamExt, stream::BoxStream};
use model::events::DataEvent;
use serde_json::Value;
use std::pin::pin;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod events;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "stratum-sink",
    version = "0.1.0",
    about = "Postgres destination loader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the emitted offsets
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli.command).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            warn!("Load interrupted; uncommitted events were rolled back");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!(error = %err, "stratum-sink failed");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Load { config, events } => load(&config, events.as_deref()).await,
        Commands::Check { config } => check(&config),
    }
}

fn check(path: &str) -> Result<(), CliError> {
    let config = SinkConfig::load(path)?;
    let target = config.validate()?;

    info!(
        table = %target.table,
        write_mode = %target.write_mode,
        variant = ?config.variant,
        "Config is valid"
    );

    let plan = prepare(
        target.write_mode,
        &target.table,
        &target.columns,
        &target.id_column,
    );
    output::print_plan(&plan);
    Ok(())
}

async fn load(config_path: &str, events_path: Option<&str>) -> Result<(), CliError> {
    let config = SinkConfig::load(config_path)?;
    let target = config.validate()?;
    let store = PgStore::connect(config.connection_url()?).await?;

    let shutdown = ShutdownCoordinator::default();
    shutdown.register_handlers();

    let (events, failure) = open_events(events_path, &shutdown).await?;

    info!(table = %target.table, variant = ?config.variant, "Starting load session");

    let snapshot = match config.variant {
        PipelineVariant::Direct => {
            let pipeline = DirectPipeline::new(store, target)?;
            let metrics = pipeline.metrics();
            emit_offsets(pipeline.into_stream(events)).await?;
            metrics.snapshot()
        }
        PipelineVariant::Staged => {
            let retry_metrics = Metrics::new();
            let runner = postgres_retry(config.retry_policy()).with_metrics(retry_metrics.clone());
            let pipeline = StagedPipeline::new(store, target, runner, config.stream_write_mode)?;
            let metrics = pipeline.metrics();
            emit_offsets(pipeline.into_stream(events)).await?;
            MetricsSnapshot {
                retries: retry_metrics.snapshot().retries,
                ..metrics.snapshot()
            }
        }
    };

    output::log_metrics(&snapshot);

    // The pipeline closed cleanly, but the input may have stopped early
    match failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn open_events(
    path: Option<&str>,
    shutdown: &ShutdownCoordinator,
) -> Result<(BoxStream<'static, DataEvent<Value>>, events::FailureSlot), CliError> {
    let cancel = shutdown.cancel_token();

    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(read_events(BufReader::new(file), cancel))
        }
        None => Ok(read_events(BufReader::new(tokio::io::stdin()), cancel)),
    }
}

async fn emit_offsets(
    offsets: impl Stream<Item = Result<Value, PipelineError>>,
) -> Result<u64, CliError> {
    let mut offsets = pin!(offsets);
    let mut emitted = 0;

    while let Some(offset) = offsets.next().await {
        output::print_offset(&offset?)?;
        emitted += 1;
    }

    Ok(emitted)
}
