use crate::error::CliError;
use engine_core::metrics::MetricsSnapshot;
use serde_json::Value;
use std::io::Write;
use tracing::info;

/// Prints one committed offset as a single JSON line and flushes, so the
/// producer sees it as soon as the commit is durable.
pub fn print_offset(offset: &Value) -> Result<(), CliError> {
    let line = serde_json::to_string(offset).map_err(CliError::JsonSerialize)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

pub fn print_plan(statements: &[String]) {
    for statement in statements {
        println!("{statement};");
    }
}

pub fn log_metrics(snapshot: &MetricsSnapshot) {
    info!(
        rows_loaded = snapshot.rows_loaded,
        bytes_loaded = snapshot.bytes_loaded,
        rows_deleted = snapshot.rows_deleted,
        commits = snapshot.commits,
        retries = snapshot.retries,
        "Load session finished"
    );
}
