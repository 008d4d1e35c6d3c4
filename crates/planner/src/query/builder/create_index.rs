use crate::query::ast::create_index::CreateIndex;
use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct CreateIndexBuilder {
    ast: CreateIndex,
}

impl CreateIndexBuilder {
    /// Starts an index on `table`, named `<table>_<columns>_idx` unless renamed.
    pub fn new(table: TableRef, columns: &[&str]) -> Self {
        let name = format!("{}_{}_idx", table.name, columns.join("_"));
        Self {
            ast: CreateIndex {
                name,
                table,
                columns: columns.iter().map(|c| c.to_string()).collect(),
                if_not_exists: false,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.ast.name = name.to_string();
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.ast.if_not_exists = true;
        self
    }

    pub fn build(self) -> CreateIndex {
        self.ast
    }
}
