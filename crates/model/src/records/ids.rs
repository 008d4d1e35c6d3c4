use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Identifier values of one delete batch. A batch is homogeneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdValues {
    Text(Vec<String>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Decimal(Vec<BigDecimal>),
}

impl IdValues {
    pub fn len(&self) -> usize {
        match self {
            IdValues::Text(v) => v.len(),
            IdValues::Int(v) => v.len(),
            IdValues::Float(v) => v.len(),
            IdValues::Decimal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdValues::Text(_) => "text",
            IdValues::Int(_) => "int",
            IdValues::Float(_) => "float",
            IdValues::Decimal(_) => "decimal",
        }
    }
}

/// A batch of record identifiers together with the size declared by the
/// producer. The declared size is trusted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct IdBatch {
    declared_len: usize,
    values: IdValues,
}

impl IdBatch {
    pub fn new(values: IdValues) -> Self {
        Self {
            declared_len: values.len(),
            values,
        }
    }

    pub fn with_declared_len(values: IdValues, declared_len: usize) -> Self {
        Self {
            declared_len,
            values,
        }
    }

    pub fn text<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IdValues::Text(ids.into_iter().map(Into::into).collect()))
    }

    pub fn int(ids: impl IntoIterator<Item = i64>) -> Self {
        Self::new(IdValues::Int(ids.into_iter().collect()))
    }

    pub fn float(ids: impl IntoIterator<Item = f64>) -> Self {
        Self::new(IdValues::Float(ids.into_iter().collect()))
    }

    pub fn decimal(ids: impl IntoIterator<Item = BigDecimal>) -> Self {
        Self::new(IdValues::Decimal(ids.into_iter().collect()))
    }

    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    pub fn is_empty(&self) -> bool {
        self.declared_len == 0
    }

    pub fn values(&self) -> &IdValues {
        &self.values
    }
}
