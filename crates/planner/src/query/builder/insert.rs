use crate::query::ast::insert::InsertSelect;
use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct InsertSelectBuilder {
    ast: InsertSelect,
}

impl InsertSelectBuilder {
    pub fn new(table: TableRef, source: TableRef) -> Self {
        Self {
            ast: InsertSelect {
                table,
                columns: Vec::new(),
                source,
            },
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.ast.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> InsertSelect {
        self.ast
    }
}
