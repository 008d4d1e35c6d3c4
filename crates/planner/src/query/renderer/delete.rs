use crate::query::{
    ast::delete::Delete,
    renderer::{Render, Renderer},
};

impl Render for Delete {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("DELETE FROM ");
        r.render_table_ref(&self.table);

        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }

        if let Some((source, alias)) = &self.using {
            r.sql.push_str(" USING ");
            r.render_table_ref(source);
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }

        if let Some(selection) = &self.selection {
            r.sql.push_str(" WHERE ");
            selection.render(r);
        }
    }
}
