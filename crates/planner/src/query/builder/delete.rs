use crate::query::ast::{
    delete::Delete,
    expr::{BinaryOp, BinaryOperator, Expr},
};
use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    ast: Delete,
}

impl DeleteBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Delete {
                table,
                alias: None,
                using: None,
                selection: None,
            },
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.ast.alias = Some(alias.to_string());
        self
    }

    pub fn using(mut self, source: TableRef, alias: &str) -> Self {
        self.ast.using = Some((source, alias.to_string()));
        self
    }

    /// Adds a predicate; repeated calls are AND-ed together.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.ast.selection = Some(match self.ast.selection.take() {
            Some(existing) => Expr::BinaryOp(Box::new(BinaryOp {
                left: existing,
                op: BinaryOperator::And,
                right: condition,
            })),
            None => condition,
        });
        self
    }

    pub fn build(self) -> Delete {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            ast::expr::{Expr, Literal},
            builder::delete::DeleteBuilder,
            ident,
        },
        table_ref,
    };

    #[test]
    fn test_filters_are_and_ed() {
        let ast = DeleteBuilder::new(table_ref!("users"))
            .filter(ident("a"))
            .filter(Expr::Literal(Literal::Null))
            .build();

        match ast.selection {
            Some(Expr::BinaryOp(op)) => {
                assert_eq!(op.left, ident("a"));
                assert_eq!(op.right, Expr::Literal(Literal::Null));
            }
            other => panic!("unexpected selection: {other:?}"),
        }
        assert!(ast.using.is_none());
    }
}
