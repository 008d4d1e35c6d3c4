pub mod column;
pub mod identifiers;
