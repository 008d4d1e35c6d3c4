//! Turns an ordered stream of load events into store mutations and emits the
//! offset of every commit once it is durable.

use crate::error::PipelineError;
use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt, stream};
use model::events::{DataEvent, Event};
use std::fmt;
use tracing::{debug, warn};

pub mod direct;
pub mod staged;

pub use direct::DirectPipeline;
pub use staged::StagedPipeline;

/// Where a session stands. `Loading`, `Deleting` and `Committed` loop until
/// the input ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Prepared,
    Loading,
    Deleting,
    Committed,
    Closed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Prepared => "prepared",
            PipelineState::Loading => "loading",
            PipelineState::Deleting => "deleting",
            PipelineState::Committed => "committed",
            PipelineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Applies load events for one session.
#[async_trait]
pub trait EventHandler<O: Send + 'static>: Send {
    /// Applies one event and returns the offset to emit, which only a commit
    /// produces.
    async fn apply(&mut self, event: DataEvent<O>) -> Result<Option<O>, PipelineError>;

    /// Called once the input is exhausted. Work since the last commit is
    /// rolled back and every session resource is released.
    async fn close(&mut self) -> Result<(), PipelineError>;

    /// Called after `apply` failed. Rolls back and releases; failures here are
    /// logged so the original error is what the caller sees.
    async fn abort(&mut self);

    fn state(&self) -> PipelineState;
}

/// Drives `handler` over `events` as a lazy stream of offsets.
///
/// Event n+1 is not pulled before event n has been applied. The first error
/// aborts the session, is yielded, and ends the stream.
pub fn run<H, O, E>(
    handler: H,
    events: E,
) -> impl Stream<Item = Result<O, PipelineError>> + Send
where
    H: EventHandler<O> + 'static,
    O: Send + 'static,
    E: Stream<Item = DataEvent<O>> + Send + 'static,
{
    let session = (handler, events.boxed());

    stream::try_unfold(session, |(mut handler, mut events)| async move {
        while let Some(event) = events.next().await {
            debug!(event = event.event_type(), state = %handler.state(), "Applying event");

            match handler.apply(event).await {
                Ok(Some(offset)) => return Ok(Some((offset, (handler, events)))),
                Ok(None) => continue,
                Err(err) => {
                    warn!(error = %err, "Load session failed, aborting");
                    handler.abort().await;
                    return Err(err);
                }
            }
        }

        handler.close().await?;
        Ok(None)
    })
}

/// Runs a pipeline stream to completion and returns every emitted offset.
pub async fn collect_offsets<O>(
    offsets: impl Stream<Item = Result<O, PipelineError>>,
) -> Result<Vec<O>, PipelineError> {
    offsets.try_collect().await
}
