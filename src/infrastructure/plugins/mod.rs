pub mod duckdb_confirm;
pub mod intent_log;

pub use duckdb_confirm::*;
pub use intent_log::*;
