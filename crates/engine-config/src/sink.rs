use crate::{env::EnvContext, error::ConfigError};
use engine_core::{retry::RetryPolicy, sink::LoadTarget};
use model::{
    core::{column::Column, identifiers::TableRef},
    execution::write_mode::{StreamWriteMode, WriteMode},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::{debug, info};

/// Overrides the connection string of the config file when set.
pub const CONNECTION_URL_ENV: &str = "STRATUM_SINK_URL";

/// Which pipeline drives the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVariant {
    /// Writes straight into the target table.
    #[default]
    Direct,
    /// Writes into a staging table and merges on commit.
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

/// Settings of one load session, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    /// Postgres connection string. May be supplied through the environment instead.
    #[serde(default)]
    pub connection: Option<String>,
    /// Logical resource path, `/table` or `/schema/table`.
    pub path: String,
    #[serde(default = "default_schema")]
    pub default_schema: String,
    pub columns: Vec<Column>,
    pub id_column: String,
    #[serde(default)]
    pub filter_column: Option<String>,
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default)]
    pub stream_write_mode: StreamWriteMode,
    #[serde(default)]
    pub variant: PipelineVariant,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_schema() -> String {
    "public".to_string()
}

impl SinkConfig {
    /// Reads the file at `path` and applies overrides from the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&raw)?;
        config.apply_env(&EnvContext::from_process());
        info!(path = %path.display(), variant = ?config.variant, "Loaded sink config");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn apply_env(&mut self, env: &EnvContext) {
        if let Some(url) = env.get(CONNECTION_URL_ENV) {
            debug!("Connection string taken from {CONNECTION_URL_ENV}");
            self.connection = Some(url.to_string());
        }
    }

    pub fn connection_url(&self) -> Result<&str, ConfigError> {
        self.connection
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "no connection string given; set `connection` or {CONNECTION_URL_ENV}"
                ))
            })
    }

    /// Resolves the destination table and checks the column settings.
    pub fn validate(&self) -> Result<LoadTarget, ConfigError> {
        let table = TableRef::resolve(&self.path, &self.default_schema)?;

        let mut target = LoadTarget::new(table, self.columns.clone(), self.id_column.clone())
            .with_write_mode(self.write_mode);
        if let Some(filter) = &self.filter_column {
            target = target.with_filter_column(filter.clone());
        }

        target
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(target)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.max_delay_ms),
        )
    }
}
