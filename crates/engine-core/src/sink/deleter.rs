use crate::{
    error::SinkError,
    metrics::Metrics,
    retry::{StatementRunner, execute_statement},
};
use connectors::sql::base::{query::generator::QueryGenerator, store::Store};
use model::{core::identifiers::TableRef, records::ids::IdBatch};
use planner::query::dialect::Postgres;
use tracing::debug;

/// Deletes rows by identifier with a single `IN (...)` statement per batch.
#[derive(Debug, Default)]
pub struct IdentityDeleter {
    metrics: Option<Metrics>,
}

impl IdentityDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Metrics) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    /// Returns the number of deleted rows. A batch declared empty issues no
    /// statement at all.
    pub async fn delete_by_ids<S, R>(
        &self,
        store: &S,
        runner: &R,
        table: &TableRef,
        id_column: &str,
        ids: &IdBatch,
    ) -> Result<u64, SinkError>
    where
        S: Store,
        R: StatementRunner,
    {
        if ids.is_empty() {
            debug!(table = %table, "Skipping empty delete batch");
            return Ok(0);
        }

        let sql = QueryGenerator::new(&Postgres).delete_in(table, id_column, ids);
        let deleted = execute_statement(store, runner, &sql).await?;

        debug!(
            table = %table,
            ids = ids.declared_len(),
            kind = ids.values().kind(),
            deleted,
            "Deleted rows by id"
        );
        if let Some(metrics) = &self.metrics {
            metrics.increment_rows_deleted(deleted);
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::NoRetry;
    use bigdecimal::BigDecimal;
    use connectors::test_utils::MemoryStore;
    use model::records::ids::IdValues;
    use std::str::FromStr;

    async fn delete(store: &MemoryStore, ids: IdBatch) -> u64 {
        IdentityDeleter::new()
            .delete_by_ids(store, &NoRetry, &TableRef::new("public", "t"), "id", &ids)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_statement() {
        let store = MemoryStore::new();

        assert_eq!(delete(&store, IdBatch::int([])).await, 0);
        assert_eq!(
            delete(
                &store,
                IdBatch::with_declared_len(IdValues::Text(vec!["a".into()]), 0)
            )
            .await,
            0
        );
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn test_one_statement_per_batch_for_each_id_type() {
        let store = MemoryStore::new();
        store.set_affected("DELETE", 2);

        let batches = vec![
            IdBatch::text(["a", "b"]),
            IdBatch::int([5, 7]),
            IdBatch::float([0.5, 2.0]),
            IdBatch::decimal([
                BigDecimal::from_str("1.10").unwrap(),
                BigDecimal::from_str("99").unwrap(),
            ]),
        ];
        for batch in batches {
            assert_eq!(delete(&store, batch).await, 2);
        }

        assert_eq!(
            store.statements(),
            vec![
                r#"DELETE FROM "public"."t" WHERE "id" IN ('a', 'b')"#,
                r#"DELETE FROM "public"."t" WHERE "id" IN (5, 7)"#,
                r#"DELETE FROM "public"."t" WHERE "id" IN (0.5, 2.0)"#,
                r#"DELETE FROM "public"."t" WHERE "id" IN (1.10, 99)"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_counts_deleted_rows() {
        let store = MemoryStore::new();
        store.set_affected("DELETE", 2);
        let metrics = Metrics::new();
        let deleter = IdentityDeleter::with_metrics(metrics.clone());

        deleter
            .delete_by_ids(
                &store,
                &NoRetry,
                &TableRef::new("public", "t"),
                "id",
                &IdBatch::int([5, 7]),
            )
            .await
            .unwrap();

        assert_eq!(metrics.snapshot().rows_deleted, 2);
    }
}
