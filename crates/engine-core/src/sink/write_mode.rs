use crate::{error::SinkError, sink::LoadTarget};
use connectors::sql::base::{query::generator::QueryGenerator, store::Store};
use model::{
    core::{column::Column, identifiers::TableRef},
    execution::write_mode::WriteMode,
};
use planner::query::dialect::Postgres;
use tracing::{debug, info};

/// The DDL that prepares `table` for a session under `mode`, in order.
pub fn prepare(
    mode: WriteMode,
    table: &TableRef,
    columns: &[Column],
    id_column: &str,
) -> Vec<String> {
    let generator = QueryGenerator::new(&Postgres);

    let mut statements = match mode {
        WriteMode::Create => vec![generator.create_table(table, columns, false, false)],
        WriteMode::Replace => vec![
            generator.drop_table(table),
            generator.create_table(table, columns, false, false),
        ],
        WriteMode::Truncate => vec![
            generator.create_table(table, columns, true, false),
            generator.truncate(table),
        ],
        WriteMode::Append => vec![generator.create_table(table, columns, true, false)],
    };

    statements.push(generator.create_index(table, id_column));
    statements
}

/// Runs the preparation DDL of one session, at most once.
///
/// DDL failures are fatal for the session and are not retried here.
#[derive(Debug)]
pub struct TablePreparer {
    mode: WriteMode,
    prepared: bool,
}

impl TablePreparer {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            prepared: false,
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub async fn run<S: Store>(&mut self, store: &S, target: &LoadTarget) -> Result<(), SinkError> {
        if self.prepared {
            return Err(SinkError::AlreadyPrepared(target.table.to_string()));
        }
        self.prepared = true;

        info!(table = %target.table, mode = %self.mode, "Preparing target table");
        for sql in prepare(self.mode, &target.table, &target.columns, &target.id_column) {
            debug!(sql = %sql, "Executing preparation DDL");
            store.execute(&sql).await?;
        }

        Ok(())
    }
}
