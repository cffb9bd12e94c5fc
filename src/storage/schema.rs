//! Baseline schema and seed rows

use serde::{Deserialize, Serialize};

/// SQL to create the book table
pub const CREATE_BOOK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS book (
    id INTEGER PRIMARY KEY,
    name TEXT
)
"#;

/// SQL to create the user table
pub const CREATE_USER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY,
    name TEXT,
    sex TEXT
)
"#;

/// Baseline rows of the book table
pub const BOOK_SEED: &[(i64, &str)] = &[(3, "Android"), (4, "Ios")];

/// Baseline rows of the user table
pub const USER_SEED: &[(i64, &str, &str)] = &[(1, "Tom", "male"), (2, "Jake", "female")];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_BOOK_TABLE, CREATE_USER_TABLE]
}

/// What to do with the baseline rows when the store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedPolicy {
    /// Wipe both tables and insert the baseline rows
    Reset,
    /// Insert the baseline rows only into tables that have none
    #[default]
    IfEmpty,
    /// Leave the tables alone
    Never,
}
