use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub name: String,
    pub table: TableRef,
    pub columns: Vec<String>,
    pub if_not_exists: bool,
}
