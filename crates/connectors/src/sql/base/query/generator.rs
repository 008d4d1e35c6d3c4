use model::{
    core::{column::Column, identifiers::TableRef},
    records::ids::{IdBatch, IdValues},
};
use planner::query::{
    ast::{
        expr::{BinaryOp, BinaryOperator, Expr, Literal},
        truncate::Truncate,
    },
    builder::{
        copy::CopyBuilder, create_index::CreateIndexBuilder, create_table::CreateTableBuilder,
        delete::DeleteBuilder, drop_table::DropTableBuilder, insert::InsertSelectBuilder,
    },
    dialect::Dialect,
    ident, qualified,
    renderer::{Render, Renderer},
};

const TARGET_ALIAS: &str = "t";
const SOURCE_ALIAS: &str = "s";

/// Renders every statement the sink issues against the store.
pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// `COPY` for header-less UTF-8 CSV, with columns in load order.
    pub fn copy_from_stdin(&self, table: &TableRef, columns: &[Column]) -> String {
        let copy_ast = CopyBuilder::new(table.clone())
            .columns(&column_names(columns))
            .option("FORMAT", Some("csv"))
            .option("HEADER", Some("FALSE"))
            .option("ENCODING", Some(self.dialect.quote_literal("UTF8").as_str()))
            .build();

        self.render_ast(copy_ast)
    }

    /// Every column is nullable; the loader only guarantees the column shape.
    pub fn create_table(
        &self,
        table: &TableRef,
        columns: &[Column],
        if_not_exists: bool,
        temporary: bool,
    ) -> String {
        let mut builder = CreateTableBuilder::new(table.clone());
        if if_not_exists {
            builder = builder.if_not_exists();
        }
        if temporary {
            builder = builder.temporary();
        }

        for column in columns {
            builder = builder
                .column(&column.name, column.column_type.clone())
                .nullable()
                .add();
        }

        self.render_ast(builder.build())
    }

    pub fn create_index(&self, table: &TableRef, column: &str) -> String {
        let ast = CreateIndexBuilder::new(table.clone(), &[column])
            .if_not_exists()
            .build();
        self.render_ast(ast)
    }

    pub fn drop_table(&self, table: &TableRef) -> String {
        self.render_ast(DropTableBuilder::new(table.clone()).if_exists().build())
    }

    pub fn truncate(&self, table: &TableRef) -> String {
        self.render_ast(Truncate {
            table: table.clone(),
        })
    }

    /// `DELETE ... WHERE column IN (...)` with the batch values inlined.
    pub fn delete_in(&self, table: &TableRef, column: &str, ids: &IdBatch) -> String {
        let ast = DeleteBuilder::new(table.clone())
            .filter(Expr::InList {
                expr: Box::new(ident(column)),
                list: id_literals(ids.values()),
            })
            .build();

        self.render_ast(ast)
    }

    pub fn insert_select(&self, target: &TableRef, source: &TableRef, columns: &[Column]) -> String {
        let ast = InsertSelectBuilder::new(target.clone(), source.clone())
            .columns(&column_names(columns))
            .build();
        self.render_ast(ast)
    }

    /// Removes target rows whose `key` matches a row in `source`.
    pub fn delete_using(&self, target: &TableRef, source: &TableRef, key: &str) -> String {
        let ast = DeleteBuilder::new(target.clone())
            .alias(TARGET_ALIAS)
            .using(source.clone(), SOURCE_ALIAS)
            .filter(Expr::BinaryOp(Box::new(BinaryOp {
                left: qualified(TARGET_ALIAS, key),
                op: BinaryOperator::Eq,
                right: qualified(SOURCE_ALIAS, key),
            })))
            .build();

        self.render_ast(ast)
    }

    fn render_ast(&self, ast: impl Render) -> String {
        let mut renderer = Renderer::new(self.dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }
}

fn column_names(columns: &[Column]) -> Vec<&str> {
    columns.iter().map(|c| c.name.as_str()).collect()
}

fn id_literals(values: &IdValues) -> Vec<Expr> {
    let literals: Vec<Literal> = match values {
        IdValues::Text(ids) => ids.iter().cloned().map(Literal::String).collect(),
        IdValues::Int(ids) => ids.iter().copied().map(Literal::Int).collect(),
        IdValues::Float(ids) => ids.iter().copied().map(Literal::Float).collect(),
        IdValues::Decimal(ids) => ids.iter().cloned().map(Literal::Decimal).collect(),
    };
    literals.into_iter().map(Expr::Literal).collect()
}
