use crate::sql::base::{error::DbError, store::CopyChannel};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::SinkExt;
use std::pin::Pin;
use tokio_postgres::CopyInSink;
use tracing::trace;

/// A `COPY ... FROM STDIN` in flight on a Postgres connection.
///
/// Dropping the sink before `finish` makes the driver send `CopyFail`, which
/// is how cancellation is implemented.
pub struct PgCopyChannel {
    sink: Option<Pin<Box<CopyInSink<Bytes>>>>,
}

impl PgCopyChannel {
    pub(crate) fn new(sink: CopyInSink<Bytes>) -> Self {
        Self {
            sink: Some(Box::pin(sink)),
        }
    }
}

#[async_trait]
impl CopyChannel for PgCopyChannel {
    async fn send(&mut self, data: Bytes) -> Result<(), DbError> {
        let sink = self.sink.as_mut().ok_or(DbError::CopyChannelClosed)?;
        sink.send(data).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<u64, DbError> {
        let mut sink = self.sink.take().ok_or(DbError::CopyChannelClosed)?;
        let rows = sink.as_mut().finish().await?;
        trace!(rows, "COPY finished");
        Ok(rows)
    }

    fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    fn cancel(&mut self) -> Result<(), DbError> {
        match self.sink.take() {
            Some(sink) => {
                drop(sink);
                trace!("COPY cancelled");
                Ok(())
            }
            None => Err(DbError::CopyChannelClosed),
        }
    }
}
