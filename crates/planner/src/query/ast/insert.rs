//! Defines the AST for an `INSERT ... SELECT` statement.

use model::core::identifiers::TableRef;

/// Copies `columns` from `source` into the same-named columns of `table`.
#[derive(Debug, Clone)]
pub struct InsertSelect {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub source: TableRef,
}
