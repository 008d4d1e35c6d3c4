//! An in-memory `Store` that records every interaction, for exercising the
//! load pipeline without a database.

use crate::sql::base::{
    error::DbError,
    store::{CopyChannel, Store, is_savepoint_statement},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// One recorded interaction with the store, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Begin,
    Execute(String),
    Copy {
        statement: String,
        data: String,
        rows: u64,
    },
    CopyCancelled(String),
    Commit,
    Rollback,
}

#[derive(Debug)]
struct StatementFailure {
    pattern: String,
    remaining: usize,
    transient: bool,
}

#[derive(Debug, Default)]
struct Inner {
    ops: Vec<StoreOp>,
    in_transaction: bool,
    statement_failures: Vec<StatementFailure>,
    affected: Vec<(String, u64)>,
    fail_copy_send: bool,
    fail_copy_finish: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl Inner {
    fn begin_if_idle(&mut self) {
        if !self.in_transaction {
            self.in_transaction = true;
            self.ops.push(StoreOp::Begin);
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` statements containing `pattern` fail. Transient
    /// failures surface as I/O errors, the others as unknown errors.
    pub fn fail_statement(&self, pattern: &str, times: usize, transient: bool) {
        self.lock().statement_failures.push(StatementFailure {
            pattern: pattern.to_string(),
            remaining: times,
            transient,
        });
    }

    /// Statements containing `pattern` report `rows` affected rows.
    pub fn set_affected(&self, pattern: &str, rows: u64) {
        self.lock().affected.push((pattern.to_string(), rows));
    }

    pub fn fail_copy_send(&self) {
        self.lock().fail_copy_send = true;
    }

    pub fn fail_copy_finish(&self) {
        self.lock().fail_copy_finish = true;
    }

    pub fn fail_commit(&self) {
        self.lock().fail_commit = true;
    }

    pub fn fail_rollback(&self) {
        self.lock().fail_rollback = true;
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Executed statements without the savepoint bookkeeping.
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Execute(sql) if !is_savepoint_statement(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(statement, data)` of every finished copy.
    pub fn copies(&self) -> Vec<(String, String)> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Copy {
                    statement, data, ..
                } => Some((statement.clone(), data.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, expected: &StoreOp) -> usize {
        self.lock().ops.iter().filter(|op| *op == expected).count()
    }

    pub fn cancels(&self) -> usize {
        self.lock()
            .ops
            .iter()
            .filter(|op| matches!(op, StoreOp::CopyCancelled(_)))
            .count()
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().in_transaction
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Copy = MemoryCopyChannel;

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let mut inner = self.lock();
        inner.begin_if_idle();
        inner.ops.push(StoreOp::Execute(sql.to_string()));

        if let Some(failure) = inner
            .statement_failures
            .iter_mut()
            .find(|f| f.remaining > 0 && sql.contains(&f.pattern))
        {
            failure.remaining -= 1;
            return Err(if failure.transient {
                DbError::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    format!("injected transient failure: {sql}"),
                ))
            } else {
                DbError::Unknown(format!("injected failure: {sql}"))
            });
        }

        let affected = inner
            .affected
            .iter()
            .find(|(pattern, _)| sql.contains(pattern))
            .map_or(0, |(_, rows)| *rows);
        Ok(affected)
    }

    async fn copy_in(&self, statement: &str) -> Result<MemoryCopyChannel, DbError> {
        let mut inner = self.lock();
        inner.begin_if_idle();

        Ok(MemoryCopyChannel {
            store: self.clone(),
            statement: statement.to_string(),
            data: Vec::new(),
            active: true,
            fail_send: std::mem::take(&mut inner.fail_copy_send),
            fail_finish: std::mem::take(&mut inner.fail_copy_finish),
        })
    }

    async fn commit(&self) -> Result<(), DbError> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.fail_commit) {
            inner.in_transaction = false;
            return Err(DbError::Unknown("injected commit failure".into()));
        }
        if inner.in_transaction {
            inner.in_transaction = false;
            inner.ops.push(StoreOp::Commit);
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.fail_rollback) {
            return Err(DbError::Unknown("injected rollback failure".into()));
        }
        if inner.in_transaction {
            inner.in_transaction = false;
            inner.ops.push(StoreOp::Rollback);
        }
        Ok(())
    }
}

pub struct MemoryCopyChannel {
    store: MemoryStore,
    statement: String,
    data: Vec<u8>,
    active: bool,
    fail_send: bool,
    fail_finish: bool,
}

#[async_trait]
impl CopyChannel for MemoryCopyChannel {
    async fn send(&mut self, data: Bytes) -> Result<(), DbError> {
        if !self.active {
            return Err(DbError::CopyChannelClosed);
        }
        if self.fail_send {
            return Err(DbError::Unknown("injected copy send failure".into()));
        }
        self.data.extend_from_slice(&data);
        Ok(())
    }

    async fn finish(&mut self) -> Result<u64, DbError> {
        if !self.active {
            return Err(DbError::CopyChannelClosed);
        }
        if self.fail_finish {
            return Err(DbError::Unknown("injected copy finish failure".into()));
        }
        self.active = false;

        let data = String::from_utf8_lossy(&self.data).into_owned();
        let rows = data.lines().filter(|line| !line.is_empty()).count() as u64;
        self.store.lock().ops.push(StoreOp::Copy {
            statement: self.statement.clone(),
            data,
            rows,
        });
        Ok(rows)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn cancel(&mut self) -> Result<(), DbError> {
        if !self.active {
            return Err(DbError::CopyChannelClosed);
        }
        self.active = false;
        self.store
            .lock()
            .ops
            .push(StoreOp::CopyCancelled(self.statement.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_transaction_boundaries() {
        let store = MemoryStore::new();
        store.execute("TRUNCATE TABLE t").await.unwrap();
        store.commit().await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Begin,
                StoreOp::Execute("TRUNCATE TABLE t".into()),
                StoreOp::Commit,
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_atomic_wraps_in_savepoint() {
        let store = MemoryStore::new();
        store.fail_statement("INSERT", 1, true);

        let err = store.execute_atomic("INSERT INTO t").await.unwrap_err();
        assert!(matches!(err, DbError::Io(_)));
        store.execute_atomic("INSERT INTO t").await.unwrap();

        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Begin,
                StoreOp::Execute("SAVEPOINT stratum_stmt".into()),
                StoreOp::Execute("INSERT INTO t".into()),
                StoreOp::Execute("ROLLBACK TO SAVEPOINT stratum_stmt".into()),
                StoreOp::Execute("SAVEPOINT stratum_stmt".into()),
                StoreOp::Execute("INSERT INTO t".into()),
                StoreOp::Execute("RELEASE SAVEPOINT stratum_stmt".into()),
            ]
        );
        assert_eq!(store.statements(), vec!["INSERT INTO t", "INSERT INTO t"]);
    }

    #[tokio::test]
    async fn test_execute_atomic_reports_failed_release() {
        let store = MemoryStore::new();
        store.set_affected("INSERT", 4);
        store.fail_statement("RELEASE SAVEPOINT", 1, true);

        let err = store.execute_atomic("INSERT INTO t").await.unwrap_err();

        match err {
            DbError::SavepointRelease(source) => assert!(matches!(*source, DbError::Io(_))),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.statements(), vec!["INSERT INTO t"]);
        assert!(
            !store
                .ops()
                .contains(&StoreOp::Execute("ROLLBACK TO SAVEPOINT stratum_stmt".into()))
        );
    }

    #[tokio::test]
    async fn test_copy_channel_counts_rows_and_cancels_once() {
        let store = MemoryStore::new();

        let mut channel = store.copy_in("COPY t").await.unwrap();
        channel.send(Bytes::from_static(b"1,a\n2,b\n")).await.unwrap();
        assert_eq!(channel.finish().await.unwrap(), 2);
        assert!(!channel.is_active());
        assert!(matches!(channel.cancel(), Err(DbError::CopyChannelClosed)));

        let mut channel = store.copy_in("COPY t").await.unwrap();
        channel.cancel().unwrap();
        assert!(channel.cancel().is_err());
        assert_eq!(store.cancels(), 1);
        assert_eq!(
            store.copies(),
            vec![("COPY t".to_string(), "1,a\n2,b\n".to_string())]
        );
    }
}
