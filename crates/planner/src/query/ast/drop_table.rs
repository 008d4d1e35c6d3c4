use model::core::identifiers::TableRef;

#[derive(Debug, Clone)]
pub struct DropTable {
    pub table: TableRef,
    pub if_exists: bool,
}
