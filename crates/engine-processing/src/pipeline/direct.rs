use crate::{
    error::PipelineError,
    pipeline::{EventHandler, PipelineState, run},
};
use async_trait::async_trait;
use connectors::sql::base::store::Store;
use engine_core::{
    metrics::Metrics,
    retry::NoRetry,
    sink::{
        LoadTarget, deleter::IdentityDeleter, loader::BulkLoader, write_mode::TablePreparer,
    },
};
use futures::Stream;
use model::events::DataEvent;
use tracing::{debug, info, warn};

/// Writes straight into the target table. The declared write mode is applied
/// once, before the first event that touches data.
pub struct DirectPipeline<S: Store> {
    store: S,
    target: LoadTarget,
    preparer: TablePreparer,
    loader: BulkLoader,
    deleter: IdentityDeleter,
    metrics: Metrics,
    state: PipelineState,
}

impl<S: Store> DirectPipeline<S> {
    pub fn new(store: S, target: LoadTarget) -> Result<Self, PipelineError> {
        target.validate()?;
        let metrics = Metrics::new();

        Ok(Self {
            store,
            preparer: TablePreparer::new(target.write_mode),
            target,
            loader: BulkLoader::with_metrics(metrics.clone()),
            deleter: IdentityDeleter::with_metrics(metrics.clone()),
            metrics,
            state: PipelineState::Idle,
        })
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Consumes the pipeline into a lazy stream of committed offsets.
    pub fn into_stream<O, E>(
        self,
        events: E,
    ) -> impl Stream<Item = Result<O, PipelineError>> + Send
    where
        O: Send + 'static,
        E: Stream<Item = DataEvent<O>> + Send + 'static,
    {
        run(self, events)
    }

    async fn ensure_prepared(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Idle {
            self.preparer.run(&self.store, &self.target).await?;
            self.state = PipelineState::Prepared;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Store, O: Send + 'static> EventHandler<O> for DirectPipeline<S> {
    async fn apply(&mut self, event: DataEvent<O>) -> Result<Option<O>, PipelineError> {
        if self.state == PipelineState::Closed {
            return Err(PipelineError::Closed);
        }

        if let DataEvent::Mode(mode) = event {
            debug!(%mode, "Direct load ignores stream write mode");
            return Ok(None);
        }

        self.ensure_prepared().await?;

        match event {
            DataEvent::Create(data) => {
                self.state = PipelineState::Loading;
                self.loader
                    .load(&self.store, &self.target.table, &self.target.columns, data)
                    .await?;
                Ok(None)
            }
            DataEvent::Delete(ids) => {
                self.state = PipelineState::Deleting;
                self.deleter
                    .delete_by_ids(
                        &self.store,
                        &NoRetry,
                        &self.target.table,
                        &self.target.id_column,
                        &ids,
                    )
                    .await?;
                Ok(None)
            }
            DataEvent::Commit(offset) => {
                self.store.commit().await?;
                self.metrics.increment_commits(1);
                self.state = PipelineState::Committed;
                info!(table = %self.target.table, "Committed load window");
                Ok(Some(offset))
            }
            DataEvent::Mode(_) => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Closed {
            return Ok(());
        }
        self.state = PipelineState::Closed;

        self.store.rollback().await?;
        info!(
            table = %self.target.table,
            bytes_loaded = self.loader.bytes_loaded(),
            "Load session closed"
        );
        Ok(())
    }

    async fn abort(&mut self) {
        self.state = PipelineState::Closed;
        if let Err(err) = self.store.rollback().await {
            warn!(error = %err, "Failed to roll back aborted load session");
        }
    }

    fn state(&self) -> PipelineState {
        self.state
    }
}
