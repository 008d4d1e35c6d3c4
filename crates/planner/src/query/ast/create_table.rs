//! Defines the AST for a CREATE TABLE statement.

use model::core::{column::ColumnType, identifiers::TableRef};

#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDef>,
    pub if_not_exists: bool,
    pub temporary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: ColumnType,
    pub is_nullable: bool,
}
