//! Row data model: column values, row value maps and result sets

use std::collections::BTreeMap;
use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A single column value as SQLite stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Parse a literal typed on the command line.
    ///
    /// `null` (any case) is Null, then integer, then real; anything else is text.
    pub fn infer(literal: &str) -> Self {
        if literal.eq_ignore_ascii_case("null") {
            Value::Null
        } else if let Ok(i) = literal.parse::<i64>() {
            Value::Integer(i)
        } else if let Ok(f) = literal.parse::<f64>() {
            Value::Real(f)
        } else {
            Value::Text(literal.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        })
    }
}

/// Column -> value mapping supplied for insert and update.
///
/// Keys are not checked against any schema here; unknown columns are
/// rejected by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowValues(BTreeMap<String, Value>);

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value (builder style)
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    pub fn put(&mut self, column: &str, value: impl Into<Value>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RowValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of a query: column names plus rows in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value at (`row`, `column`), if both exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Rows as column -> value maps
    pub fn iter_maps(&self) -> impl Iterator<Item = BTreeMap<&str, &Value>> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_literals() {
        assert_eq!(Value::infer("5"), Value::Integer(5));
        assert_eq!(Value::infer("-12"), Value::Integer(-12));
        assert_eq!(Value::infer("2.5"), Value::Real(2.5));
        assert_eq!(Value::infer("NULL"), Value::Null);
        assert_eq!(Value::infer("Linux"), Value::Text("Linux".to_string()));
    }

    #[test]
    fn test_row_values_builder() {
        let values = RowValues::new().with("id", 5).with("name", "Linux");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("id"), Some(&Value::Integer(5)));
        assert_eq!(values.get("name").and_then(Value::as_str), Some("Linux"));

        let collected: RowValues = [("id", 5)].into_iter().collect();
        assert_eq!(collected.get("id"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_row_set_lookup() {
        let set = RowSet {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![Value::Integer(3), Value::from("Android")],
                vec![Value::Integer(4), Value::from("Ios")],
            ],
        };
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1, "name"), Some(&Value::from("Ios")));
        assert_eq!(set.get(2, "name"), None);
        assert_eq!(set.get(0, "missing"), None);

        let first = set.iter_maps().next().unwrap();
        assert_eq!(first["id"], &Value::Integer(3));
    }

    #[test]
    fn test_untagged_json() {
        let values = RowValues::new().with("id", 5).with("name", "Linux").with("gone", Value::Null);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"gone":null,"id":5,"name":"Linux"}"#);
    }
}
