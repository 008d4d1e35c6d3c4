#[doc(hidden)]
pub use model::core::identifiers::TableRef as __TableRef;

/// Shorthand for a `TableRef`; a bare name lands in the `public` schema.
#[macro_export]
macro_rules! table_ref {
    ($name:expr) => {
        $crate::query::macros::__TableRef::new("public", $name)
    };
    ($schema:expr, $name:expr) => {
        $crate::query::macros::__TableRef::new($schema, $name)
    };
}
