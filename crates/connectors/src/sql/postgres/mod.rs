pub mod copy;
pub mod store;
pub mod utils;
