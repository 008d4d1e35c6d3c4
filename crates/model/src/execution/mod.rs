pub mod write_mode;
