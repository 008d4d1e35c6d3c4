//! Defines the AST for DELETE statements.

use crate::query::ast::expr::Expr;
use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct Delete {
    pub table: TableRef,
    pub alias: Option<String>,
    /// Optional `USING <table> AS <alias>` source.
    pub using: Option<(TableRef, String)>,
    pub selection: Option<Expr>,
}
