//! Defines the AST for SQL expressions.

use bigdecimal::BigDecimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column identifier, e.g., `id` or `t.id`.
    Identifier(Ident),

    /// An inlined literal value.
    Literal(Literal),

    /// A binary operation, e.g., `t.id = s.id`.
    BinaryOp(Box<BinaryOp>),

    /// A membership test, e.g., `id IN (1, 2, 3)`.
    InList { expr: Box<Expr>, list: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 't' in 't.id'
    pub name: String,              // e.g., the 'id' in 't.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    And,
}

/// Literal values rendered directly into the statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Null,
}
