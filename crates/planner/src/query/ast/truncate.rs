use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct Truncate {
    pub table: TableRef,
}
