use crate::error::CliError;
use futures_util::stream::{self, BoxStream, StreamExt};
use model::{
    events::DataEvent,
    execution::write_mode::StreamWriteMode,
    records::ids::{IdBatch, IdValues},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

/// One line of the event file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
enum WireEvent {
    Create(String),
    Delete(IdValues),
    Commit(Value),
    Mode(StreamWriteMode),
}

impl From<WireEvent> for DataEvent<Value> {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Create(rows) => DataEvent::create(rows),
            WireEvent::Delete(ids) => DataEvent::Delete(IdBatch::new(ids)),
            WireEvent::Commit(offset) => DataEvent::Commit(offset),
            WireEvent::Mode(mode) => DataEvent::Mode(mode),
        }
    }
}

pub fn parse_event(line: &str) -> Result<DataEvent<Value>, serde_json::Error> {
    serde_json::from_str::<WireEvent>(line).map(Into::into)
}

/// Holds the reason the event reader stopped early, if any.
#[derive(Clone, Default)]
pub struct FailureSlot(Arc<Mutex<Option<CliError>>>);

impl FailureSlot {
    /// Keeps the first failure only.
    fn set(&self, err: CliError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(err);
    }

    pub fn take(&self) -> Option<CliError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Reads JSON-lines events from `reader`, one per line, skipping blank lines.
///
/// A malformed line, a read error or cancellation ends the stream. The cause is
/// left in the returned slot so it can be reported once the session has closed.
pub fn read_events<R>(
    reader: R,
    cancel: CancellationToken,
) -> (BoxStream<'static, DataEvent<Value>>, FailureSlot)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let failure = FailureSlot::default();
    let slot = failure.clone();

    let events = stream::unfold((reader.lines(), 0usize), move |(mut lines, mut line_no)| {
        let slot = slot.clone();
        let cancel = cancel.clone();

        async move {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        slot.set(CliError::ShutdownRequested);
                        return None;
                    }
                    next = lines.next_line() => next,
                };
                line_no += 1;

                match next {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match parse_event(&line) {
                        Ok(event) => return Some((event, (lines, line_no))),
                        Err(source) => {
                            slot.set(CliError::EventParse {
                                line: line_no,
                                source,
                            });
                            return None;
                        }
                    },
                    Ok(None) => return None,
                    Err(err) => {
                        slot.set(err.into());
                        return None;
                    }
                }
            }
        }
    })
    .boxed();

    (events, failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn collect(
        input: &str,
        cancel: CancellationToken,
    ) -> (Vec<DataEvent<Value>>, FailureSlot) {
        let (events, failure) = read_events(Cursor::new(input.to_string().into_bytes()), cancel);
        (events.collect().await, failure)
    }

    #[test]
    fn test_parse_each_event_kind() {
        assert_eq!(
            parse_event(r#"{"create": "1,a\n2,b\n"}"#).unwrap(),
            DataEvent::create("1,a\n2,b\n")
        );
        assert_eq!(
            parse_event(r#"{"delete": {"int": [5, 7]}}"#).unwrap(),
            DataEvent::Delete(IdBatch::int([5, 7]))
        );
        assert_eq!(
            parse_event(r#"{"commit": {"lsn": 42}}"#).unwrap(),
            DataEvent::Commit(serde_json::json!({"lsn": 42}))
        );
        assert_eq!(
            parse_event(r#"{"mode": "append"}"#).unwrap(),
            DataEvent::Mode(StreamWriteMode::Append)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_events() {
        assert!(parse_event(r#"{"upsert": "1,a"}"#).is_err());
        assert!(parse_event("not json").is_err());
    }

    #[tokio::test]
    async fn test_read_skips_blank_lines() {
        let input = "{\"create\": \"1,a\\n\"}\n\n{\"commit\": \"o1\"}\n";
        let (events, failure) = collect(input, CancellationToken::new()).await;

        assert_eq!(events.len(), 2);
        assert!(events[1].is_commit());
        assert!(failure.take().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_ends_stream() {
        let input = "{\"commit\": 1}\n{\"commit\": \n{\"commit\": 2}\n";
        let (events, failure) = collect(input, CancellationToken::new()).await;

        assert_eq!(events, vec![DataEvent::Commit(serde_json::json!(1))]);
        assert!(matches!(
            failure.take(),
            Some(CliError::EventParse { line: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_reader_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (events, failure) = collect("{\"commit\": 1}\n", cancel).await;

        assert!(events.is_empty());
        assert!(matches!(failure.take(), Some(CliError::ShutdownRequested)));
    }
}
