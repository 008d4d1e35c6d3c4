//! Staged loading: rows are copied into a private staging table and merged
//! into the target on every commit.

use crate::{
    error::SinkError,
    metrics::Metrics,
    retry::{StatementRunner, execute_statement},
    sink::{LoadTarget, deleter::IdentityDeleter, loader::BulkLoader, write_mode::TablePreparer},
};
use bytes::Bytes;
use connectors::sql::base::{query::generator::QueryGenerator, store::Store};
use model::{core::identifiers::TableRef, records::ids::IdBatch};
use planner::query::dialect::Postgres;
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use uuid::Uuid;

const STAGING_PREFIX: &str = "__stratum_stage_";

/// Owns one staging table for the lifetime of a load.
///
/// The staging table is a session temporary table, so other connections never
/// see it and the server drops it when the session ends. `release` drops it
/// explicitly. A flow dropped without being released schedules the rollback
/// and the drop on the current runtime.
pub struct StagingFlow<S: Store, R: StatementRunner> {
    store: S,
    runner: R,
    target: LoadTarget,
    staging: TableRef,
    loader: BulkLoader,
    deleter: IdentityDeleter,
    released: bool,
}

impl<S: Store, R: StatementRunner> StagingFlow<S, R> {
    /// Prepares the target for `target.write_mode`, then creates the staging
    /// table and its id index.
    pub async fn acquire(
        store: S,
        target: LoadTarget,
        runner: R,
        metrics: Metrics,
    ) -> Result<Self, SinkError> {
        target.validate()?;

        let mut preparer = TablePreparer::new(target.write_mode);
        preparer.run(&store, &target).await?;

        let staging =
            TableRef::session_temp(format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple()));

        let flow = Self {
            store,
            runner,
            staging,
            loader: BulkLoader::with_metrics(metrics.clone()),
            deleter: IdentityDeleter::with_metrics(metrics),
            released: false,
            target,
        };

        let generator = QueryGenerator::new(&Postgres);
        flow.run(&generator.create_table(&flow.staging, &flow.target.columns, false, true))
            .await?;
        flow.run(&generator.create_index(&flow.staging, &flow.target.id_column))
            .await?;

        info!(table = %flow.target.table, staging = %flow.staging, "Acquired staging table");
        Ok(flow)
    }

    pub fn staging_table(&self) -> &TableRef {
        &self.staging
    }

    pub fn target(&self) -> &LoadTarget {
        &self.target
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn bytes_loaded(&self) -> u64 {
        self.loader.bytes_loaded()
    }

    /// Copies one batch into the staging table.
    pub async fn ingest(&mut self, data: Bytes) -> Result<u64, SinkError> {
        self.ensure_active()?;
        self.loader
            .load(&self.store, &self.staging, &self.target.columns, data)
            .await
    }

    /// Deletes `ids` from the target and from rows staged earlier in the
    /// same commit window. Returns the rows deleted from the target.
    pub async fn delete(&mut self, ids: &IdBatch) -> Result<u64, SinkError> {
        self.ensure_active()?;
        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self
            .deleter
            .delete_by_ids(
                &self.store,
                &self.runner,
                &self.target.table,
                &self.target.id_column,
                ids,
            )
            .await?;

        let sql = QueryGenerator::new(&Postgres).delete_in(
            &self.staging,
            &self.target.id_column,
            ids,
        );
        self.run(&sql).await?;

        Ok(deleted)
    }

    /// Replaces target rows with the staged rows. With a filter column only
    /// target rows matching a staged row are removed, otherwise the whole
    /// target is cleared. Returns the number of rows merged.
    pub async fn replace(&mut self) -> Result<u64, SinkError> {
        self.ensure_active()?;
        let generator = QueryGenerator::new(&Postgres);

        let clear = match &self.target.filter_column {
            Some(filter) => generator.delete_using(&self.target.table, &self.staging, filter),
            None => generator.truncate(&self.target.table),
        };
        self.run(&clear).await?;

        self.merge(&generator).await
    }

    /// Appends the staged rows to the target. Returns the number of rows
    /// merged.
    pub async fn append(&mut self) -> Result<u64, SinkError> {
        self.ensure_active()?;
        self.merge(&QueryGenerator::new(&Postgres)).await
    }

    /// Drops the staging table and commits. Calling it again is a no-op.
    pub async fn release(&mut self) -> Result<(), SinkError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let sql = QueryGenerator::new(&Postgres).drop_table(&self.staging);
        self.run(&sql).await?;
        self.store.commit().await?;

        info!(staging = %self.staging, "Released staging table");
        Ok(())
    }

    async fn merge(&self, generator: &QueryGenerator<'_>) -> Result<u64, SinkError> {
        let merged = self
            .run(&generator.insert_select(
                &self.target.table,
                &self.staging,
                &self.target.columns,
            ))
            .await?;
        self.run(&generator.truncate(&self.staging)).await?;
        Ok(merged)
    }

    async fn run(&self, sql: &str) -> Result<u64, SinkError> {
        Ok(execute_statement(&self.store, &self.runner, sql).await?)
    }

    fn ensure_active(&self) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Released(self.staging.to_string()));
        }
        Ok(())
    }
}

impl<S: Store, R: StatementRunner> Drop for StagingFlow<S, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let Ok(handle) = Handle::try_current() else {
            warn!(staging = %self.staging, "No runtime available, staging table left behind");
            return;
        };

        let store = self.store.clone();
        let staging = self.staging.to_string();
        let sql = QueryGenerator::new(&Postgres).drop_table(&self.staging);

        info!(staging = %staging, "Releasing staging table on drop");

        // Since `drop` cannot be async, the cleanup runs on a spawned task.
        handle.spawn(async move {
            // Committing after a failed rollback could publish the aborted window.
            if let Err(e) = store.rollback().await {
                error!(staging = %staging, error = %e, "Failed to roll back before dropping staging table");
                return;
            }
            if let Err(e) = store.execute(&sql).await {
                error!(staging = %staging, error = %e, "Failed to drop staging table");
                return;
            }
            if let Err(e) = store.commit().await {
                error!(staging = %staging, error = %e, "Failed to commit staging table drop");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{ClassifiedRetry, NoRetry, RetryDisposition, RetryPolicy};
    use connectors::{
        sql::base::error::DbError,
        test_utils::{MemoryStore, StoreOp},
    };
    use model::{
        core::column::{Column, ColumnType},
        execution::write_mode::WriteMode,
    };
    use std::time::Duration;

    fn target() -> LoadTarget {
        LoadTarget::new(
            TableRef::new("public", "t"),
            vec![
                Column::new("id", ColumnType::BigInt),
                Column::new("name", ColumnType::Text),
            ],
            "id",
        )
    }

    fn staged(flow: &StagingFlow<MemoryStore, impl StatementRunner>) -> String {
        format!(r#""pg_temp"."{}""#, flow.staging_table().name)
    }

    #[tokio::test]
    async fn test_acquire_prepares_target_then_staging() {
        let store = MemoryStore::new();
        let flow = StagingFlow::acquire(
            store.clone(),
            target().with_write_mode(WriteMode::Truncate),
            NoRetry,
            Metrics::new(),
        )
        .await
        .unwrap();

        let stage = staged(&flow);
        assert!(flow.staging_table().name.starts_with(STAGING_PREFIX));
        assert_eq!(flow.staging_table().schema, "pg_temp");
        assert_eq!(
            store.statements(),
            vec![
                r#"CREATE TABLE IF NOT EXISTS "public"."t" ("id" BIGINT, "name" TEXT)"#.to_string(),
                r#"TRUNCATE TABLE "public"."t""#.to_string(),
                r#"CREATE INDEX IF NOT EXISTS "t_id_idx" ON "public"."t" ("id")"#.to_string(),
                format!(r#"CREATE TEMP TABLE {stage} ("id" BIGINT, "name" TEXT)"#),
                format!(
                    r#"CREATE INDEX IF NOT EXISTS "{}_id_idx" ON {stage} ("id")"#,
                    flow.staging_table().name
                ),
            ]
        );

        let mut flow = flow;
        flow.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_without_filter_truncates_target() {
        let store = MemoryStore::new();
        let mut flow = StagingFlow::acquire(store.clone(), target(), NoRetry, Metrics::new())
            .await
            .unwrap();
        let stage = staged(&flow);

        flow.ingest(Bytes::from_static(b"1,a\n")).await.unwrap();
        flow.replace().await.unwrap();

        let statements = store.statements();
        assert_eq!(
            &statements[statements.len() - 3..],
            &[
                r#"TRUNCATE TABLE "public"."t""#.to_string(),
                format!(r#"INSERT INTO "public"."t" ("id", "name") SELECT "id", "name" FROM {stage}"#),
                format!("TRUNCATE TABLE {stage}"),
            ]
        );
        assert_eq!(store.copies()[0].1, "1,a\n");

        flow.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_with_filter_deletes_matching_rows() {
        let store = MemoryStore::new();
        let mut flow = StagingFlow::acquire(
            store.clone(),
            target().with_filter_column("id"),
            NoRetry,
            Metrics::new(),
        )
        .await
        .unwrap();
        let stage = staged(&flow);

        flow.replace().await.unwrap();

        let statements = store.statements();
        assert_eq!(
            statements[statements.len() - 3],
            format!(
                r#"DELETE FROM "public"."t" AS "t" USING {stage} AS "s" WHERE "t"."id" = "s"."id""#
            )
        );

        flow.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_append_and_delete() {
        let store = MemoryStore::new();
        let mut flow = StagingFlow::acquire(store.clone(), target(), NoRetry, Metrics::new())
            .await
            .unwrap();
        let stage = staged(&flow);
        let before = store.statements().len();

        assert_eq!(flow.delete(&IdBatch::int([])).await.unwrap(), 0);
        flow.delete(&IdBatch::int([5])).await.unwrap();
        flow.append().await.unwrap();

        assert_eq!(
            store.statements()[before..].to_vec(),
            vec![
                r#"DELETE FROM "public"."t" WHERE "id" IN (5)"#.to_string(),
                format!(r#"DELETE FROM {stage} WHERE "id" IN (5)"#),
                format!(r#"INSERT INTO "public"."t" ("id", "name") SELECT "id", "name" FROM {stage}"#),
                format!("TRUNCATE TABLE {stage}"),
            ]
        );

        flow.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_release_is_idempotent_and_final() {
        let store = MemoryStore::new();
        let mut flow = StagingFlow::acquire(store.clone(), target(), NoRetry, Metrics::new())
            .await
            .unwrap();
        let stage = staged(&flow);

        flow.release().await.unwrap();
        flow.release().await.unwrap();

        let drops = store
            .statements()
            .into_iter()
            .filter(|sql| *sql == format!("DROP TABLE IF EXISTS {stage}"))
            .count();
        assert_eq!(drops, 1);
        assert_eq!(store.count(&StoreOp::Commit), 1);
        assert!(matches!(
            flow.append().await,
            Err(SinkError::Released(_))
        ));
    }

    #[tokio::test]
    async fn test_transient_merge_failure_is_retried() {
        let store = MemoryStore::new();
        let metrics = Metrics::new();
        let runner = ClassifiedRetry::new(
            RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
            |err: &DbError| match err {
                DbError::Io(_) => RetryDisposition::Retry,
                _ => RetryDisposition::Stop,
            },
        )
        .with_metrics(metrics.clone());

        let mut flow = StagingFlow::acquire(store.clone(), target(), runner, metrics.clone())
            .await
            .unwrap();
        store.fail_statement("INSERT INTO", 1, true);

        flow.append().await.unwrap();

        assert_eq!(metrics.snapshot().retries, 1);
        assert!(
            store
                .ops()
                .contains(&StoreOp::Execute("ROLLBACK TO SAVEPOINT stratum_stmt".into()))
        );
        flow.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_flow_cleans_up() {
        let store = MemoryStore::new();
        let flow = StagingFlow::acquire(store.clone(), target(), NoRetry, Metrics::new())
            .await
            .unwrap();
        let stage = staged(&flow);

        drop(flow);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let ops = store.ops();
        let tail = &ops[ops.len() - 4..];
        assert_eq!(
            tail,
            &[
                StoreOp::Rollback,
                StoreOp::Begin,
                StoreOp::Execute(format!("DROP TABLE IF EXISTS {stage}")),
                StoreOp::Commit,
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_flow_does_not_commit_after_failed_rollback() {
        let store = MemoryStore::new();
        let mut flow = StagingFlow::acquire(store.clone(), target(), NoRetry, Metrics::new())
            .await
            .unwrap();
        flow.ingest(Bytes::from_static(b"1,a\n")).await.unwrap();
        store.fail_rollback();

        drop(flow);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(store.count(&StoreOp::Commit), 0);
        assert!(!store.statements().iter().any(|sql| sql.starts_with("DROP TABLE")));
        assert!(store.in_transaction());
    }
}
