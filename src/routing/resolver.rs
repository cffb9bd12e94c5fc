//! Table resolver: match code -> logical table name

use std::collections::HashMap;

use super::matcher::MatchCode;

/// Fixed code -> table mapping, frozen once dispatch starts.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    tables: HashMap<MatchCode, String>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `code` to `table`; a later mapping for the same code replaces the earlier one.
    pub fn insert(&mut self, code: MatchCode, table: impl Into<String>) {
        self.tables.insert(code, table.into());
    }

    /// Resolve a match result to a table name.
    ///
    /// `None` (no match), an unmapped code and an empty table name all
    /// resolve to `None`; callers don't get to tell them apart.
    pub fn resolve(&self, code: Option<MatchCode>) -> Option<&str> {
        self.tables
            .get(&code?)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
