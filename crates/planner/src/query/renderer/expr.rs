use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, Ident, Literal},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Literal(literal) => literal.render(r),
            Expr::BinaryOp(op) => op.render(r),
            Expr::InList { expr, list } => {
                expr.render(r);
                r.sql.push_str(" IN (");
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    item.render(r);
                }
                r.sql.push(')');
            }
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for Literal {
    fn render(&self, r: &mut Renderer) {
        let rendered = r.dialect.render_literal(self);
        r.sql.push_str(&rendered);
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::And => " AND ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::expr::{BinaryOp, BinaryOperator, Expr, Literal},
        dialect::Postgres,
        ident, qualified,
        renderer::{Render, Renderer},
    };

    #[test]
    fn test_render_in_list() {
        let expr = Expr::InList {
            expr: Box::new(ident("id")),
            list: vec![
                Expr::Literal(Literal::String("a".into())),
                Expr::Literal(Literal::String("b'c".into())),
            ],
        };

        let mut renderer = Renderer::new(&Postgres);
        expr.render(&mut renderer);
        assert_eq!(renderer.finish(), r#""id" IN ('a', 'b''c')"#);
    }

    #[test]
    fn test_render_qualified_equality() {
        let expr = Expr::BinaryOp(Box::new(BinaryOp {
            left: qualified("t", "id"),
            op: BinaryOperator::Eq,
            right: qualified("s", "id"),
        }));

        let mut renderer = Renderer::new(&Postgres);
        expr.render(&mut renderer);
        assert_eq!(renderer.finish(), r#""t"."id" = "s"."id""#);
    }
}
