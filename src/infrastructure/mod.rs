pub mod duckdb_storage;
pub mod hooks;
pub mod plugins;
pub mod repository;

#[cfg(test)]
pub mod test_utils;

pub use duckdb_storage::*;
pub use hooks::*;
pub use plugins::*;
pub use repository::*;
