use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema alias Postgres resolves to the current session's temporary schema.
pub const SESSION_TEMP_SCHEMA: &str = "pg_temp";

/// A resolved, schema-qualified destination table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Resolves a logical resource path into a table.
    ///
    /// `/table` (or `table`) lands in `default_schema`, `/schema/table` is used
    /// as-is. Anything else does not address exactly one table.
    pub fn resolve(path: &str, default_schema: &str) -> Result<Self, ResolutionError> {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();

        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ResolutionError::NotAResource(path.to_string()));
        }

        match segments.as_slice() {
            [name] if !default_schema.trim().is_empty() => Ok(Self::new(default_schema, *name)),
            [schema, name] => Ok(Self::new(*schema, *name)),
            _ => Err(ResolutionError::NotAResource(path.to_string())),
        }
    }

    /// A table private to the current session, dropped when the session ends.
    pub fn session_temp(name: impl Into<String>) -> Self {
        Self::new(SESSION_TEMP_SCHEMA, name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
