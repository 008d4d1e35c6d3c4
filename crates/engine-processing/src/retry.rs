use connectors::sql::base::error::DbError;
use engine_core::retry::{ClassifiedRetry, RetryDisposition, RetryPolicy};
use tokio_postgres::{Error as PgError, error::SqlState};

/// Statement runner that retries transient Postgres failures.
pub type PostgresRetry = ClassifiedRetry<fn(&DbError) -> RetryDisposition>;

pub fn postgres_retry(policy: RetryPolicy) -> PostgresRetry {
    ClassifiedRetry::new(policy, classify_db_error as fn(&DbError) -> RetryDisposition)
}

/// Only server-reported transient conditions are retried. A broken socket
/// loses the open transaction, so replaying one statement cannot recover it.
pub fn classify_db_error(err: &DbError) -> RetryDisposition {
    match err {
        DbError::Postgres(pg_err) => classify_pg_error(pg_err),
        DbError::Io(_) => RetryDisposition::Stop,
        DbError::SavepointRelease(_) => RetryDisposition::Stop,
        DbError::CopyChannelClosed => RetryDisposition::Stop,
        DbError::Unknown(_) => RetryDisposition::Stop,
    }
}

pub fn classify_pg_error(err: &PgError) -> RetryDisposition {
    // A closed client takes the session's transaction with it.
    if err.is_closed() {
        return RetryDisposition::Stop;
    }

    if let Some(code) = err.code()
        && is_retryable_pg_code(code)
    {
        return RetryDisposition::Retry;
    }

    RetryDisposition::Stop
}

fn is_retryable_pg_code(code: &SqlState) -> bool {
    matches!(
        *code,
        SqlState::T_R_SERIALIZATION_FAILURE
            | SqlState::T_R_DEADLOCK_DETECTED
            | SqlState::LOCK_NOT_AVAILABLE
            | SqlState::CONNECTION_EXCEPTION
            | SqlState::CONNECTION_FAILURE
            | SqlState::CONNECTION_DOES_NOT_EXIST
            | SqlState::CANNOT_CONNECT_NOW
    )
}
