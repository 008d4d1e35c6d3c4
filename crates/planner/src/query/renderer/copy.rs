use crate::query::ast::copy::Copy;
use crate::query::renderer::{Render, Renderer};

impl Render for Copy {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("COPY ");
        r.render_table_ref(&self.table);

        if !self.columns.is_empty() {
            r.sql.push_str(" (");
            r.render_column_list(&self.columns);
            r.sql.push(')');
        }

        r.sql.push_str(" FROM STDIN");

        if !self.options.is_empty() {
            r.sql.push_str(" WITH (");
            for (i, option) in self.options.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                r.sql.push_str(&option.key);
                if let Some(value) = &option.value {
                    r.sql.push(' ');
                    r.sql.push_str(value);
                }
            }
            r.sql.push(')');
        }
    }
}
