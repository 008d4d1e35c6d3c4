use connectors::sql::base::error::DbError;
use model::error::ResolutionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Invalid columns: {0}")]
    InvalidColumns(String),

    #[error("Table {0} was already prepared in this session")]
    AlreadyPrepared(String),

    #[error("Staging table {0} was already released")]
    Released(String),
}
