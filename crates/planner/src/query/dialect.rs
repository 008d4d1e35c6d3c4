//! Defines the `Dialect` trait for database-specific SQL syntax.

use crate::query::ast::expr::Literal;
use model::core::column::ColumnType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect, escaping embedded quotes.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Wraps a string in single quotes, escaping embedded quotes.
    fn quote_literal(&self, value: &str) -> String;

    /// Renders a literal so it can be inlined into statement text.
    fn render_literal(&self, literal: &Literal) -> String;

    /// Renders a column type tag into a database-specific SQL type string.
    fn render_data_type(&self, data_type: &ColumnType) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn render_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Int(v) => v.to_string(),
            Literal::Float(v) if v.is_nan() => self.quote_literal("NaN"),
            Literal::Float(v) if v.is_infinite() && *v > 0.0 => self.quote_literal("Infinity"),
            Literal::Float(v) if v.is_infinite() => self.quote_literal("-Infinity"),
            // Debug keeps the fractional part (`1.0`) so the value stays numeric.
            Literal::Float(v) => format!("{v:?}"),
            Literal::Decimal(v) => v.to_string(),
            Literal::String(v) => self.quote_literal(v),
            Literal::Null => "NULL".to_string(),
        }
    }

    fn render_data_type(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::SmallInt => "SMALLINT".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::Real => "REAL".into(),
            ColumnType::Double => "DOUBLE PRECISION".into(),
            ColumnType::Numeric(None) => "NUMERIC".into(),
            ColumnType::Numeric(Some((precision, scale))) => {
                format!("NUMERIC({precision}, {scale})")
            }
            ColumnType::Text => "TEXT".into(),
            ColumnType::Varchar(None) => "VARCHAR".into(),
            ColumnType::Varchar(Some(len)) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Date => "DATE".into(),
            ColumnType::Time => "TIME".into(),
            ColumnType::TimeTz => "TIME WITH TIME ZONE".into(),
            ColumnType::Timestamp => "TIMESTAMP".into(),
            ColumnType::TimestampTz => "TIMESTAMP WITH TIME ZONE".into(),
            ColumnType::Interval => "INTERVAL".into(),
            ColumnType::Uuid => "UUID".into(),
            ColumnType::Json => "JSON".into(),
            ColumnType::Jsonb => "JSONB".into(),
            ColumnType::Bytea => "BYTEA".into(),
        }
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(Postgres.quote_identifier("id"), r#""id""#);
        assert_eq!(Postgres.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_render_literals() {
        let d = Postgres;
        assert_eq!(d.render_literal(&Literal::Int(-5)), "-5");
        assert_eq!(d.render_literal(&Literal::Float(1.0)), "1.0");
        assert_eq!(d.render_literal(&Literal::Float(2.5e-3)), "0.0025");
        assert_eq!(d.render_literal(&Literal::Float(f64::NAN)), "'NaN'");
        assert_eq!(
            d.render_literal(&Literal::Float(f64::NEG_INFINITY)),
            "'-Infinity'"
        );
        assert_eq!(
            d.render_literal(&Literal::String("O'Brien".into())),
            "'O''Brien'"
        );

        let decimal = BigDecimal::from_str("12.500").unwrap();
        assert_eq!(d.render_literal(&Literal::Decimal(decimal)), "12.500");
    }

    #[test]
    fn test_render_data_types() {
        let d = Postgres;
        assert_eq!(d.render_data_type(&ColumnType::Numeric(Some((10, 2)))), "NUMERIC(10, 2)");
        assert_eq!(d.render_data_type(&ColumnType::Varchar(None)), "VARCHAR");
        assert_eq!(d.render_data_type(&ColumnType::Double), "DOUBLE PRECISION");
        assert_eq!(d.name(), "PostgreSQL");
    }
}
