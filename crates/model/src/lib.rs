pub mod core;
pub mod error;
pub mod events;
pub mod execution;
pub mod records;
