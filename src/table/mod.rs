//! In-memory relational table.
//!
//! A [`Table`] is an immutable, ordered sequence of rows sharing one column
//! schema. Operators (see [`ops`]) never modify the receiver; each returns a
//! fresh table.
//!
//! # Schema
//!
//! The schema is explicit and checked on construction: every row supplies a
//! value for every column, in schema order. A table with no rows still knows
//! its columns, so "does this column exist" questions never depend on the
//! first row.
//!
//! # Reserved columns
//!
//! - [`GROUP_COLUMN`] (`_group_`) carries the group id of a grouped table.
//! - [`JOIN_COLUMN`] (`_join_`) carries the key value of a joined row.

pub mod aggregate;
pub mod error;
pub mod ops;

pub use aggregate::Aggregate;
pub use error::{ensure, TableError, TableResult};

use crate::types::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Column holding the group id of a grouped table
pub const GROUP_COLUMN: &str = "_group_";

/// Column holding the key value of a joined row
pub const JOIN_COLUMN: &str = "_join_";

/// A JSON object representing one row
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Immutable ordered rows with a shared column schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of a single row together with its table's schema
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Look up a value by column name, failing if the column doesn't exist
    pub fn get(&self, column: &str) -> TableResult<&'a Value> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &values[i])
            .ok_or_else(|| TableError::missing_column(column, self.columns))
    }

    /// Column names of this row, in schema order
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    /// Values of this row, in schema order
    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

impl Table {
    /// Build a table from a schema and positional rows.
    ///
    /// Fails if a column name repeats or a row's width differs from the schema.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> TableResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::InvalidSchema(format!(
                    "duplicate column {}",
                    column
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::InvalidSchema(format!(
                    "row {} has {} values but the schema has {} columns",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from JSON objects.
    ///
    /// The first record fixes the schema (in key order); every other record
    /// must carry exactly the same keys. Values must be numbers, strings or
    /// booleans.
    pub fn from_records(records: Vec<Record>) -> TableResult<Self> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            if record.len() != columns.len() {
                return Err(TableError::InvalidSchema(format!(
                    "record {} has {} fields but the schema has {} columns",
                    i,
                    record.len(),
                    columns.len()
                )));
            }
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let json = record.get(column).ok_or_else(|| {
                    TableError::InvalidSchema(format!("record {} has no field {}", i, column))
                })?;
                row.push(json_to_value(json).ok_or_else(|| {
                    TableError::InvalidSchema(format!(
                        "record {} field {} is not a number, string or boolean",
                        i, column
                    ))
                })?);
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    /// Internal constructor for operators that already uphold the schema invariant
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Column names in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Test whether the table has the named column
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// True if the table carries a `_group_` column
    pub fn is_grouped(&self) -> bool {
        self.has_column(GROUP_COLUMN)
    }

    /// Position of a column in the schema, failing if absent
    pub fn column_index(&self, name: &str) -> TableResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::missing_column(name, &self.columns))
    }

    /// Get a column's values, in row order
    pub fn column(&self, name: &str) -> TableResult<Vec<Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Borrow a row by position
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Iterate over rows in order
    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        self.rows.iter().map(move |values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Get a single cell, if both row and column exist
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Convert one row to a JSON object
    pub fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|values| {
            self.columns
                .iter()
                .zip(values)
                .map(|(c, v)| (c.clone(), v.to_json()))
                .collect()
        })
    }

    /// Convert all rows to JSON objects
    pub fn to_records(&self) -> Vec<Record> {
        (0..self.rows.len()).filter_map(|i| self.record(i)).collect()
    }

    /// All rows as a JSON array of objects
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.to_records()
                .into_iter()
                .map(serde_json::Value::Object)
                .collect(),
        )
    }
}

fn json_to_value(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        _ => None,
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_records().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<Record>::deserialize(deserializer)?;
        Table::from_records(records).map_err(<D::Error as serde::de::Error>::custom)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "= {} =", self.rows.len())?;
        for values in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(values)
                .map(|(c, v)| format!("{}: {}", c, v))
                .collect();
            writeln!(f, "{{{}}}", cells.join(", "))?;
        }
        Ok(())
    }
}
