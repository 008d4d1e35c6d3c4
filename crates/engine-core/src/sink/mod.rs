use crate::error::SinkError;
use model::{
    core::{
        column::{Column, duplicate_column, find_column},
        identifiers::TableRef,
    },
    execution::write_mode::WriteMode,
};

pub mod deleter;
pub mod loader;
pub mod staging;
pub mod write_mode;

/// Everything a session needs to know about the table it writes to.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTarget {
    pub table: TableRef,
    /// Columns in the order the producer encodes them.
    pub columns: Vec<Column>,
    pub id_column: String,
    /// Column used to match staged rows against target rows on replace.
    pub filter_column: Option<String>,
    pub write_mode: WriteMode,
}

impl LoadTarget {
    pub fn new(table: TableRef, columns: Vec<Column>, id_column: impl Into<String>) -> Self {
        Self {
            table,
            columns,
            id_column: id_column.into(),
            filter_column: None,
            write_mode: WriteMode::default(),
        }
    }

    pub fn with_filter_column(mut self, column: impl Into<String>) -> Self {
        self.filter_column = Some(column.into());
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), SinkError> {
        if self.columns.is_empty() {
            return Err(SinkError::InvalidColumns(format!(
                "no columns given for {}",
                self.table
            )));
        }

        if let Some(name) = duplicate_column(&self.columns) {
            return Err(SinkError::InvalidColumns(format!(
                "column `{name}` appears more than once"
            )));
        }

        let key_columns = std::iter::once(&self.id_column).chain(self.filter_column.as_ref());
        for name in key_columns {
            if find_column(&self.columns, name).is_none() {
                return Err(SinkError::InvalidColumns(format!(
                    "column `{name}` is not one of the load columns"
                )));
            }
        }

        Ok(())
    }
}
