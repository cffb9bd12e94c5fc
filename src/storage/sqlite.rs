//! SQLite storage implementation

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, ErrorCode};

use super::schema::{self, SeedPolicy};
use super::value::{RowSet, RowValues, Value};
use crate::{Error, Result};

/// The one connection to the backing database.
///
/// Not `Sync`: shared access goes through [`super::ConnectionHandle`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        tracing::debug!(path = %path.display(), "sqlite store opened");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Put the baseline rows in place according to `policy`
    pub fn seed(&self, policy: SeedPolicy) -> Result<()> {
        let (seed_book, seed_user) = match policy {
            SeedPolicy::Never => return Ok(()),
            SeedPolicy::Reset => {
                self.conn.execute("DELETE FROM book", [])?;
                self.conn.execute("DELETE FROM user", [])?;
                (true, true)
            }
            SeedPolicy::IfEmpty => (self.count("book")? == 0, self.count("user")? == 0),
        };

        if seed_book {
            for (id, name) in schema::BOOK_SEED {
                self.conn
                    .execute("INSERT INTO book (id, name) VALUES (?1, ?2)", params![id, name])?;
            }
        }
        if seed_user {
            for (id, name, sex) in schema::USER_SEED {
                self.conn.execute(
                    "INSERT INTO user (id, name, sex) VALUES (?1, ?2, ?3)",
                    params![id, name, sex],
                )?;
            }
        }

        tracing::debug!(?policy, seed_book, seed_user, "baseline rows seeded");
        Ok(())
    }

    // ========== CRUD Operations ==========

    /// Select rows from `table`.
    ///
    /// `projection`, `selection` and `sort_order` are SQL fragments passed
    /// through as-is; `selection_args` bind to the `?` placeholders in `selection`.
    pub fn query(
        &self,
        table: &str,
        projection: Option<&[String]>,
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> Result<RowSet> {
        let columns = match projection {
            Some(cols) if !cols.is_empty() => cols.join(", "),
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", columns, quote_identifier(table));
        push_where(&mut sql, selection);
        if let Some(order) = sort_order.filter(|o| !o.trim().is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = names.len();

        let rows = stmt
            .query_map(params_from_iter(selection_args), |row| {
                (0..width).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(RowSet { columns: names, rows })
    }

    /// Insert one row and return its rowid
    pub fn insert(&self, table: &str, values: &RowValues) -> Result<i64> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
        } else {
            let columns: Vec<String> = values.iter().map(|(c, _)| quote_identifier(c)).collect();
            let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        self.conn
            .execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))
            .map_err(|e| classify_write_error(e, sql.len()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update rows matching `selection`; returns the number of rows changed
    pub fn update(
        &self,
        table: &str,
        values: &RowValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> Result<usize> {
        if values.is_empty() {
            return Err(Error::MalformedRowValues("empty values for update".to_string()));
        }

        // values bind to ?1..?n, selection args continue from ?n+1
        let assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("{} = ?{}", quote_identifier(c), i + 1))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", quote_identifier(table), assignments.join(", "));
        let values_end = sql.len();
        push_where(&mut sql, selection);

        let bound = values.iter().map(|(_, v)| v).chain(selection_args.iter());
        let count = self
            .conn
            .execute(&sql, params_from_iter(bound))
            .map_err(|e| classify_write_error(e, values_end))?;
        Ok(count)
    }

    /// Delete rows matching `selection` (all rows when `None`)
    pub fn delete(&self, table: &str, selection: Option<&str>, selection_args: &[Value]) -> Result<usize> {
        let mut sql = format!("DELETE FROM {}", quote_identifier(table));
        push_where(&mut sql, selection);
        let count = self.conn.execute(&sql, params_from_iter(selection_args))?;
        Ok(count)
    }

    /// Count rows in a table
    pub fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn push_where(sql: &mut String, selection: Option<&str>) {
    if let Some(clause) = selection.filter(|s| !s.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
}

/// Quote a table or column name for SQLite
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema and constraint failures on writes are the caller's values being wrong.
///
/// `values_end` is the byte offset where the values part of the statement
/// ends. A prepare error pointing past it comes from the selection clause and
/// stays [`Error::Storage`].
fn classify_write_error(err: rusqlite::Error, values_end: usize) -> Error {
    if let rusqlite::Error::SqlInputError { offset, .. } = err {
        return match usize::try_from(offset) {
            Ok(at) if at < values_end => Error::MalformedRowValues(err.to_string()),
            _ => Error::Storage(err),
        };
    }
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) | Some(ErrorCode::Unknown) | Some(ErrorCode::TypeMismatch) => {
            Error::MalformedRowValues(err.to_string())
        }
        _ => Error::Storage(err),
    }
}
