use connectors::sql::base::error::DbError;
use engine_core::error::SinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// An event arrived after the session was closed or aborted.
    #[error("Pipeline is closed")]
    Closed,
}
