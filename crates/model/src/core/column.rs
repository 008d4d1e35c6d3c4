use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type tag of a destination column.
///
/// The mapping from source schema types to these tags is decided upstream;
/// the sink only renders them into DDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    /// `NUMERIC` with an optional `(precision, scale)`.
    Numeric(Option<(u32, u32)>),
    Text,
    Varchar(Option<u32>),
    Char(u32),
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Interval,
    Uuid,
    Json,
    Jsonb,
    Bytea,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.column_type)
    }
}

/// Looks up a column by exact name.
pub fn find_column<'a>(columns: &'a [Column], name: &str) -> Option<&'a Column> {
    columns.iter().find(|col| col.name == name)
}

/// Returns the first column name that appears more than once, if any.
pub fn duplicate_column(columns: &[Column]) -> Option<&str> {
    columns.iter().enumerate().find_map(|(i, col)| {
        columns[..i]
            .iter()
            .any(|prev| prev.name == col.name)
            .then_some(col.name.as_str())
    })
}
