use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared write mode. Governs what happens to the physical table once,
/// before any data of the session is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Create,
    Replace,
    Truncate,
    #[default]
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Create => "create",
            WriteMode::Replace => "replace",
            WriteMode::Truncate => "truncate",
            WriteMode::Append => "append",
        };
        f.write_str(name)
    }
}

/// Write mode carried with the event stream. Decides, per commit, whether the
/// staged rows replace the target contents or are appended to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamWriteMode {
    #[default]
    Replace,
    Append,
}

impl StreamWriteMode {
    /// Mode in effect after a commit ran under `self`.
    pub fn after_commit(self) -> Self {
        StreamWriteMode::Append
    }

    /// Applies a mode restated by the stream. Going back from `Append` to
    /// `Replace` is refused and leaves the current mode in place.
    pub fn restate(self, requested: StreamWriteMode) -> Result<Self, Self> {
        match (self, requested) {
            (StreamWriteMode::Append, StreamWriteMode::Replace) => Err(self),
            (_, requested) => Ok(requested),
        }
    }
}

impl fmt::Display for StreamWriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamWriteMode::Replace => f.write_str("replace"),
            StreamWriteMode::Append => f.write_str("append"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_mode_only_moves_towards_append() {
        let mode = StreamWriteMode::Replace;
        assert_eq!(mode.after_commit(), StreamWriteMode::Append);
        assert_eq!(
            StreamWriteMode::Append.after_commit(),
            StreamWriteMode::Append
        );

        assert_eq!(
            mode.restate(StreamWriteMode::Append),
            Ok(StreamWriteMode::Append)
        );
        assert_eq!(
            StreamWriteMode::Append.restate(StreamWriteMode::Replace),
            Err(StreamWriteMode::Append)
        );
    }

    #[test]
    fn test_write_mode_serde_names() {
        let mode: WriteMode = serde_json::from_str(r#""truncate""#).unwrap();
        assert_eq!(mode, WriteMode::Truncate);
        assert_eq!(WriteMode::default(), WriteMode::Append);
        assert_eq!(StreamWriteMode::default().to_string(), "replace");
    }
}
