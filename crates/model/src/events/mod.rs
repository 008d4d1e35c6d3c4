use crate::{execution::write_mode::StreamWriteMode, records::ids::IdBatch};
use bytes::Bytes;

/// A trait for events flowing through a load session.
pub trait Event: Send {
    /// Returns a unique identifier for this event type.
    fn event_type(&self) -> &'static str;
}

/// One load event. Order within a stream is significant: a `Commit`
/// finalizes every `Create` and `Delete` seen since the previous `Commit`.
///
/// `O` is the producer's checkpoint token. It is never inspected, only echoed
/// back once the commit it rides on is durable.
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent<O> {
    /// Pre-encoded rows (CSV, UTF-8, no header) in column order.
    Create(Bytes),
    /// Identifiers of rows to delete.
    Delete(IdBatch),
    /// Commit boundary carrying the offset to emit.
    Commit(O),
    /// Restatement of the event-carried write mode.
    Mode(StreamWriteMode),
}

impl<O> DataEvent<O> {
    pub fn create(rows: impl Into<Bytes>) -> Self {
        DataEvent::Create(rows.into())
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, DataEvent::Commit(_))
    }
}

impl<O: Send> Event for DataEvent<O> {
    fn event_type(&self) -> &'static str {
        match self {
            DataEvent::Create(_) => "load.create",
            DataEvent::Delete(_) => "load.delete",
            DataEvent::Commit(_) => "load.commit",
            DataEvent::Mode(_) => "load.mode",
        }
    }
}
