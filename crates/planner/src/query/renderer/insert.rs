use crate::query::{
    ast::insert::InsertSelect,
    renderer::{Render, Renderer},
};

impl Render for InsertSelect {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        r.render_column_list(&self.columns);
        r.sql.push_str(") SELECT ");
        r.render_column_list(&self.columns);
        r.sql.push_str(" FROM ");
        r.render_table_ref(&self.source);
    }
}
