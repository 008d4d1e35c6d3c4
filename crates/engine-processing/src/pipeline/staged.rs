use crate::{
    error::PipelineError,
    pipeline::{EventHandler, PipelineState, run},
};
use async_trait::async_trait;
use connectors::sql::base::store::Store;
use engine_core::{
    metrics::Metrics,
    retry::StatementRunner,
    sink::{LoadTarget, staging::StagingFlow},
};
use futures::Stream;
use model::{events::DataEvent, execution::write_mode::StreamWriteMode};
use tracing::{debug, info, warn};

/// Loads through a staging table and merges on every commit, replacing or
/// appending according to the stream write mode.
pub struct StagedPipeline<S: Store, R: StatementRunner> {
    store: S,
    target: LoadTarget,
    runner: Option<R>,
    flow: Option<StagingFlow<S, R>>,
    mode: StreamWriteMode,
    metrics: Metrics,
    state: PipelineState,
}

impl<S: Store, R: StatementRunner + 'static> StagedPipeline<S, R> {
    pub fn new(
        store: S,
        target: LoadTarget,
        runner: R,
        mode: StreamWriteMode,
    ) -> Result<Self, PipelineError> {
        target.validate()?;

        Ok(Self {
            store,
            target,
            runner: Some(runner),
            flow: None,
            mode,
            metrics: Metrics::new(),
            state: PipelineState::Idle,
        })
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Stream write mode the next commit will merge with.
    pub fn mode(&self) -> StreamWriteMode {
        self.mode
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

    /// Acquires the staging flow on first use, which also prepares the target.
    async fn flow(&mut self) -> Result<&mut StagingFlow<S, R>, PipelineError> {
        if self.flow.is_none() {
            let runner = self.runner.take().ok_or(PipelineError::Closed)?;
            let flow = StagingFlow::acquire(
                self.store.clone(),
                self.target.clone(),
                runner,
                self.metrics.clone(),
            )
            .await?;
            self.state = PipelineState::Prepared;
            self.flow = Some(flow);
        }

        self.flow.as_mut().ok_or(PipelineError::Closed)
    }

    fn restate(&mut self, requested: StreamWriteMode) {
        match self.mode.restate(requested) {
            Ok(mode) => {
                debug!(from = %self.mode, to = %mode, "Stream write mode restated");
                self.mode = mode;
            }
            Err(current) => {
                warn!(
                    current = %current,
                    requested = %requested,
                    "Ignoring stream write mode change back to replace"
                );
            }
        }
    }

    async fn release(&mut self) -> Result<(), PipelineError> {
        if let Some(flow) = self.flow.as_mut() {
            flow.release().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S, R, O> EventHandler<O> for StagedPipeline<S, R>
where
    S: Store,
    R: StatementRunner + 'static,
    O: Send + 'static,
{
    async fn apply(&mut self, event: DataEvent<O>) -> Result<Option<O>, PipelineError> {
        if self.state == PipelineState::Closed {
            return Err(PipelineError::Closed);
        }

        match event {
            DataEvent::Mode(requested) => {
                self.restate(requested);
                Ok(None)
            }
            DataEvent::Create(data) => {
                self.flow().await?.ingest(data).await?;
                self.state = PipelineState::Loading;
                Ok(None)
            }
            DataEvent::Delete(ids) => {
                self.flow().await?.delete(&ids).await?;
                self.state = PipelineState::Deleting;
                Ok(None)
            }
            DataEvent::Commit(offset) => {
                let mode = self.mode;
                let flow = self.flow().await?;
                let merged = match mode {
                    StreamWriteMode::Replace => flow.replace().await?,
                    StreamWriteMode::Append => flow.append().await?,
                };

                self.store.commit().await?;
                self.metrics.increment_commits(1);
                self.mode = mode.after_commit();
                self.state = PipelineState::Committed;

                info!(
                    table = %self.target.table,
                    %mode,
                    merged,
                    "Committed load window"
                );
                Ok(Some(offset))
            }
        }
    }

    async fn close(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Closed {
            return Ok(());
        }
        self.state = PipelineState::Closed;

        self.store.rollback().await?;
        self.release().await?;
        info!(table = %self.target.table, "Load session closed");
        Ok(())
    }

    async fn abort(&mut self) {
        self.state = PipelineState::Closed;
        if let Err(err) = self.store.rollback().await {
            // Releasing commits, which would publish the aborted window.
            warn!(error = %err, "Failed to roll back aborted load session");
            return;
        }
        if let Err(err) = self.release().await {
            warn!(error = %err, "Failed to release staging table after abort");
        }
    }

    fn state(&self) -> PipelineState {
        self.state
    }
}
