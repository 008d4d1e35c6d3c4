pub mod copy;
pub mod create_index;
pub mod create_table;
pub mod delete;
pub mod drop_table;
pub mod insert;
