use crate::{error::SinkError, metrics::Metrics};
use bytes::Bytes;
use connectors::sql::base::{
    error::DbError,
    query::generator::QueryGenerator,
    store::{CopyChannel, Store},
};
use model::core::{column::Column, identifiers::TableRef};
use planner::query::dialect::Postgres;
use tracing::{trace, warn};

/// Streams pre-encoded CSV rows into a table over the store's COPY channel.
#[derive(Debug, Default)]
pub struct BulkLoader {
    bytes_loaded: u64,
    metrics: Option<Metrics>,
}

impl BulkLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Metrics) -> Self {
        Self {
            bytes_loaded: 0,
            metrics: Some(metrics),
        }
    }

    /// Bytes sent by this loader across all calls.
    pub fn bytes_loaded(&self) -> u64 {
        self.bytes_loaded
    }

    /// Copies `data` into `table` and returns the number of rows the store
    /// accepted. The channel is always either finished or cancelled.
    pub async fn load<S: Store>(
        &mut self,
        store: &S,
        table: &TableRef,
        columns: &[Column],
        data: Bytes,
    ) -> Result<u64, SinkError> {
        let statement = QueryGenerator::new(&Postgres).copy_from_stdin(table, columns);
        let channel = store.copy_in(&statement).await?;
        let mut guard = CopyGuard { channel };

        let len = data.len() as u64;
        let result: Result<u64, DbError> = async {
            if !data.is_empty() {
                guard.channel.send(data).await?;
            }
            guard.channel.finish().await
        }
        .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(err) => {
                guard.cancel_if_active();
                return Err(err.into());
            }
        };

        self.bytes_loaded += len;
        trace!(
            table = %table,
            bytes = len,
            total_bytes = self.bytes_loaded,
            rows,
            "Loaded batch"
        );

        if let Some(metrics) = &self.metrics {
            metrics.increment_rows_loaded(rows);
            metrics.increment_bytes_loaded(len);
        }

        Ok(rows)
    }
}

/// Cancels a still-active copy when dropped, e.g. when the loading future is
/// abandoned mid-transfer.
struct CopyGuard<C: CopyChannel> {
    channel: C,
}

impl<C: CopyChannel> CopyGuard<C> {
    fn cancel_if_active(&mut self) {
        if !self.channel.is_active() {
            return;
        }
        if let Err(err) = self.channel.cancel() {
            warn!(error = %err, "Failed to cancel COPY channel");
        }
    }
}

impl<C: CopyChannel> Drop for CopyGuard<C> {
    fn drop(&mut self) {
        self.cancel_if_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::test_utils::{MemoryStore, StoreOp};
    use model::core::column::ColumnType;
    use tracing_test::traced_test;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::BigInt),
            Column::new("name", ColumnType::Text),
        ]
    }

    const COPY: &str = r#"COPY "public"."t" ("id", "name") FROM STDIN WITH (FORMAT csv, HEADER FALSE, ENCODING 'UTF8')"#;

    #[traced_test]
    #[tokio::test]
    async fn test_load_counts_rows_and_bytes() {
        let store = MemoryStore::new();
        let metrics = Metrics::new();
        let mut loader = BulkLoader::with_metrics(metrics.clone());
        let table = TableRef::new("public", "t");

        let rows = loader
            .load(&store, &table, &columns(), Bytes::from_static(b"1,a\n2,b\n3,c\n"))
            .await
            .unwrap();
        loader
            .load(&store, &table, &columns(), Bytes::from_static(b"4,d\n"))
            .await
            .unwrap();

        assert_eq!(rows, 3);
        assert_eq!(loader.bytes_loaded(), 16);
        assert_eq!(metrics.snapshot().rows_loaded, 4);
        assert_eq!(store.copies()[0].0, COPY);
        assert!(logs_contain("Loaded batch"));
    }

    #[tokio::test]
    async fn test_empty_payload_still_finishes_channel() {
        let store = MemoryStore::new();
        let mut loader = BulkLoader::new();

        let rows = loader
            .load(&store, &TableRef::new("public", "t"), &columns(), Bytes::new())
            .await
            .unwrap();

        assert_eq!(rows, 0);
        assert_eq!(store.copies(), vec![(COPY.to_string(), String::new())]);
        assert_eq!(store.cancels(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_cancels_once() {
        let store = MemoryStore::new();
        store.fail_copy_send();
        let mut loader = BulkLoader::new();

        let err = loader
            .load(
                &store,
                &TableRef::new("public", "t"),
                &columns(),
                Bytes::from_static(b"1,a\n"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::Db(_)));
        assert_eq!(store.cancels(), 1);
        assert!(store.copies().is_empty());
        assert_eq!(loader.bytes_loaded(), 0);
    }

    #[tokio::test]
    async fn test_finish_failure_cancels_once() {
        let store = MemoryStore::new();
        store.fail_copy_finish();
        let mut loader = BulkLoader::new();

        let result = loader
            .load(
                &store,
                &TableRef::new("public", "t"),
                &columns(),
                Bytes::from_static(b"1,a\n"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.count(&StoreOp::CopyCancelled(COPY.to_string())),
            1
        );
    }

    #[tokio::test]
    async fn test_guard_cancels_only_active_channels() {
        let store = MemoryStore::new();

        let channel = store.copy_in(COPY).await.unwrap();
        drop(CopyGuard { channel });
        assert_eq!(store.cancels(), 1);

        let mut channel = store.copy_in(COPY).await.unwrap();
        channel.finish().await.unwrap();
        drop(CopyGuard { channel });
        assert_eq!(store.cancels(), 1);
    }
}
