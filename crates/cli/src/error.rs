use connectors::sql::base::error::ConnectorError;
use engine_config::error::ConfigError;
use engine_processing::error::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the destination: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Load session failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Malformed event on line {line}: {source}")]
    EventParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
