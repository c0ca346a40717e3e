//! Database module: the operations tables and their queries.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the `Storage` handle, connection and schema setup
//! - `models.rs`: row structs that need conversion into domain types
//! - one module per table group with its `impl Storage` queries

pub mod business;
pub mod calls;
pub mod email;
pub mod leads;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod voice_ai;

pub use calls::CallLogQuery;
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
