use crate::sql::base::error::DbError;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

const STATEMENT_SAVEPOINT: &str = "stratum_stmt";

/// An open bulk-copy channel into one table.
///
/// A channel is active from the moment it is opened until it is either
/// finished or cancelled. Cancelling an inactive channel is an error, so
/// callers check `is_active` first.
#[async_trait]
pub trait CopyChannel: Send {
    /// Streams one chunk of encoded rows.
    async fn send(&mut self, data: Bytes) -> Result<(), DbError>;

    /// Ends the copy and returns the number of rows the store accepted.
    async fn finish(&mut self) -> Result<u64, DbError>;

    fn is_active(&self) -> bool;

    /// Aborts the copy. Must not block, so it can run from `Drop`.
    fn cancel(&mut self) -> Result<(), DbError>;
}

/// One connection with auto-commit disabled.
///
/// The first statement after a commit or rollback opens a transaction; work
/// stays invisible until `commit` is called. Handles are cheap to clone and
/// all clones share the same session.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Copy: CopyChannel;

    /// Executes one statement and returns the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, DbError>;

    /// Opens a bulk-copy channel for a `COPY ... FROM STDIN` statement.
    async fn copy_in(&self, statement: &str) -> Result<Self::Copy, DbError>;

    async fn commit(&self) -> Result<(), DbError>;

    async fn rollback(&self) -> Result<(), DbError>;

    /// Executes one statement under a savepoint, so a failure leaves the
    /// surrounding transaction usable and the statement can be retried.
    ///
    /// A failed release is reported as `DbError::SavepointRelease`, since the
    /// statement itself already succeeded.
    async fn execute_atomic(&self, sql: &str) -> Result<u64, DbError> {
        self.execute(&format!("SAVEPOINT {STATEMENT_SAVEPOINT}"))
            .await?;

        match self.execute(sql).await {
            Ok(affected) => {
                self.execute(&format!("RELEASE SAVEPOINT {STATEMENT_SAVEPOINT}"))
                    .await
                    .map_err(|err| DbError::SavepointRelease(Box::new(err)))?;
                Ok(affected)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back to statement savepoint");
                if let Err(rollback_err) = self
                    .execute(&format!("ROLLBACK TO SAVEPOINT {STATEMENT_SAVEPOINT}"))
                    .await
                {
                    warn!(error = %rollback_err, "Failed to roll back to statement savepoint");
                }
                Err(err)
            }
        }
    }
}

/// Returns `true` for the savepoint bookkeeping statements issued by
/// `Store::execute_atomic`.
pub fn is_savepoint_statement(sql: &str) -> bool {
    sql.ends_with(STATEMENT_SAVEPOINT)
        && (sql.starts_with("SAVEPOINT")
            || sql.starts_with("RELEASE SAVEPOINT")
            || sql.starts_with("ROLLBACK TO SAVEPOINT"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_savepoint_statement() {
        assert!(is_savepoint_statement("SAVEPOINT stratum_stmt"));
        assert!(is_savepoint_statement("RELEASE SAVEPOINT stratum_stmt"));
        assert!(is_savepoint_statement("ROLLBACK TO SAVEPOINT stratum_stmt"));
        assert!(!is_savepoint_statement(r#"TRUNCATE TABLE "public"."t""#));
    }
}
