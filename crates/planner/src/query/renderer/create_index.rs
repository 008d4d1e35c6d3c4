use crate::query::{
    ast::create_index::CreateIndex,
    renderer::{Render, Renderer},
};

impl Render for CreateIndex {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE INDEX ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        // Postgres places the index in the table's schema; the name is unqualified.
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
        r.sql.push_str(" ON ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        r.render_column_list(&self.columns);
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            builder::create_index::CreateIndexBuilder,
            dialect::Postgres,
            renderer::{Render, Renderer},
        },
        table_ref,
    };

    #[test]
    fn test_render_create_index() {
        let ast = CreateIndexBuilder::new(table_ref!("sales", "orders"), &["order_id"])
            .if_not_exists()
            .build();

        let mut renderer = Renderer::new(&Postgres);
        ast.render(&mut renderer);

        assert_eq!(
            renderer.finish(),
            r#"CREATE INDEX IF NOT EXISTS "orders_order_id_idx" ON "sales"."orders" ("order_id")"#
        );
    }
}
