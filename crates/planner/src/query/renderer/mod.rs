//! Defines the core rendering trait and context for converting AST to SQL.

use crate::query::dialect::Dialect;
use model::core::identifiers::TableRef;

pub mod copy;
pub mod create_index;
pub mod create_table;
pub mod delete;
pub mod drop_table;
pub mod expr;
pub mod insert;
pub mod truncate;

/// A trait for any AST node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and provides access to the dialect for
/// syntax-specific details. Values are inlined as literals, so rendered
/// statements carry no bind parameters.
pub struct Renderer<'a> {
    pub sql: String,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final SQL string.
    pub fn finish(self) -> String {
        self.sql
    }

    pub fn render_table_ref(&mut self, table: &TableRef) {
        self.sql.push_str(&self.dialect.quote_identifier(&table.schema));
        self.sql.push('.');
        self.sql.push_str(&self.dialect.quote_identifier(&table.name));
    }

    pub fn render_column_list(&mut self, columns: &[String]) {
        let quoted = columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect::<Vec<_>>();
        self.sql.push_str(&quoted.join(", "));
    }
}
