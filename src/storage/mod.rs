//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite connection with tables:
//! - book(id, name)
//! - user(id, name, sex)
//!
//! [`ConnectionHandle`] owns that connection and serializes access to it.

pub mod handle;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use handle::{ConnectionHandle, StoreFactory};
pub use schema::SeedPolicy;
pub use sqlite::SqliteStore;
pub use value::{RowSet, RowValues, Value};
