//! Provides a fluent builder for constructing `CreateTable` ASTs.

use crate::query::ast::create_table::{ColumnDef, CreateTable};
use model::core::{column::ColumnType, identifiers::TableRef};

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    ast: CreateTable,
}

impl CreateTableBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: CreateTable {
                table,
                columns: Vec::new(),
                if_not_exists: false,
                temporary: false,
            },
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.ast.if_not_exists = true;
        self
    }

    /// Session-scoped table, invisible to other connections.
    pub fn temporary(mut self) -> Self {
        self.ast.temporary = true;
        self
    }

    pub fn column(self, name: &str, data_type: ColumnType) -> ColumnBuilder {
        ColumnBuilder::new(self, name, data_type)
    }

    pub fn build(self) -> CreateTable {
        self.ast
    }
}

pub struct ColumnBuilder {
    table_builder: CreateTableBuilder,
    column: ColumnDef,
}

impl ColumnBuilder {
    pub fn new(table_builder: CreateTableBuilder, name: &str, data_type: ColumnType) -> Self {
        Self {
            table_builder,
            column: ColumnDef {
                name: name.to_string(),
                data_type,
                is_nullable: false, // Columns are NOT NULL by default
            },
        }
    }

    pub fn nullable(mut self) -> Self {
        self.column.is_nullable = true;
        self
    }

    pub fn add(mut self) -> CreateTableBuilder {
        self.table_builder.ast.columns.push(self.column);
        self.table_builder
    }
}
