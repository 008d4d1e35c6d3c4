use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The destination path does not address exactly one table.
    #[error("Not a resource: '{0}' does not resolve to a table")]
    NotAResource(String),
}
