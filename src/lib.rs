//! # content-router - URI-routed CRUD over a single shared SQLite connection
//!
//! Callers address data with content URIs (`content://<authority>/<table>`).
//! content-router provides:
//! - URI matching and table resolution from an immutable routing table
//! - One lazily opened, serialized SQLite connection shared by all callers
//! - Query / insert / update / delete dispatch with no-op handling of unknown URIs
//! - Change notification to registered observers after every effective mutation

pub mod uri;
pub mod routing;
pub mod storage;
pub mod notify;
pub mod provider;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use uri::ContentUri;
pub use routing::{MatchCode, Route, RoutingTable};
pub use storage::{ConnectionHandle, RowSet, RowValues, SeedPolicy, SqliteStore, Value};
pub use notify::{ChangeNotifier, ChangeObserver, ObserverId};
pub use provider::ContentProvider;

/// Result type alias for content-router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for content-router operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed row values: {0}")]
    MalformedRowValues(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
