//! Table operators.
//!
//! All operators borrow the receiver and build a new [`Table`]; nothing here
//! mutates its input. Terminal steps (`notify`, `plot`) hand the table to
//! a publisher callback or the display sinks.

use super::error::{ensure, TableError, TableResult};
use super::{Aggregate, Table, GROUP_COLUMN, JOIN_COLUMN};
use crate::expr::Expr;
use crate::pipeline::sink::Sinks;
use crate::types::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Looks up published tables by name (used by `join`).
pub trait Resolver {
    fn resolve(&self, name: &str) -> Option<&Table>;
}

impl Resolver for HashMap<String, Table> {
    fn resolve(&self, name: &str) -> Option<&Table> {
        self.get(name)
    }
}

/// Hashable identity of a value, used to bucket rows into groups.
///
/// Matches "same value" semantics: NaN groups with NaN and `-0` with `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl From<&Value> for GroupKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => GroupKey::Bool(*b),
            Value::Number(n) if n.is_nan() => GroupKey::Number(f64::NAN.to_bits()),
            Value::Number(n) if *n == 0.0 => GroupKey::Number(0.0f64.to_bits()),
            Value::Number(n) => GroupKey::Number(n.to_bits()),
            Value::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}

impl Table {
    /// Create a new column (or overwrite an existing one) from a row expression.
    pub fn mutate(&self, new_column: &str, expr: &Expr) -> TableResult<Table> {
        let existing = self.columns.iter().position(|c| c == new_column);
        let mut columns = self.columns.clone();
        if existing.is_none() {
            columns.push(new_column.to_string());
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in self.iter() {
            let value = expr.eval(row)?;
            let mut values = row.values().to_vec();
            match existing {
                Some(idx) => values[idx] = value,
                None => values.push(value),
            }
            rows.push(values);
        }
        Ok(Table::from_parts(columns, rows))
    }

    /// Keep rows for which the predicate is truthy.
    pub fn filter(&self, predicate: &Expr) -> TableResult<Table> {
        let mut rows = Vec::new();
        for row in self.iter() {
            if predicate.eval(row)?.is_truthy() {
                rows.push(row.values().to_vec());
            }
        }
        Ok(Table::from_parts(self.columns.clone(), rows))
    }

    /// Project to the named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Table> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<TableResult<Vec<usize>>>()?;
        let names: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        // Selecting the same column twice is a schema error, not a silent duplicate
        Table::new(names, rows)
    }

    /// Tag every row with a `_group_` id by first appearance of `column`'s values.
    ///
    /// An existing grouping is replaced.
    pub fn group_by(&self, column: &str) -> TableResult<Table> {
        let key_idx = self.column_index(column)?;
        let existing = self.columns.iter().position(|c| c == GROUP_COLUMN);
        let mut columns = self.columns.clone();
        if existing.is_none() {
            columns.push(GROUP_COLUMN.to_string());
        }

        let mut seen: HashMap<GroupKey, usize> = HashMap::new();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let next_id = seen.len();
                let id = *seen.entry(GroupKey::from(&row[key_idx])).or_insert(next_id);
                let mut values = row.clone();
                let tag = Value::Number(id as f64);
                match existing {
                    Some(idx) => values[idx] = tag,
                    None => values.push(tag),
                }
                values
            })
            .collect();
        Ok(Table::from_parts(columns, rows))
    }

    /// Remove grouping. Fails if the table is not grouped.
    pub fn ungroup(&self) -> TableResult<Table> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == GROUP_COLUMN)
            .ok_or(TableError::NotGrouped)?;
        let mut columns = self.columns.clone();
        columns.remove(idx);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut values = row.clone();
                values.remove(idx);
                values
            })
            .collect();
        Ok(Table::from_parts(columns, rows))
    }

    /// Stable ascending sort by the given columns, compared left to right.
    pub fn sort<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Table> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<TableResult<Vec<usize>>>()?;
        let mut rows = self.rows.clone();
        rows.sort_by(|left, right| {
            indices
                .iter()
                .map(|&i| left[i].sort_cmp(&right[i]))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Table::from_parts(self.columns.clone(), rows))
    }

    /// Reverse the order of rows.
    pub fn reverse(&self) -> Table {
        let mut rows = self.rows.clone();
        rows.reverse();
        Table::from_parts(self.columns.clone(), rows)
    }

    /// Summarize one column, per group if the table is grouped.
    ///
    /// Ungrouped tables produce a single row `{column}`; grouped tables
    /// produce one row `{_group_, column}` per group in first-seen order.
    /// Summarizing `_group_` itself yields rows `{_group_: aggregate}`.
    pub fn summarize(&self, aggregate: Aggregate, column: &str) -> TableResult<Table> {
        let value_idx = self.column_index(column)?;

        let Some(group_idx) = self.columns.iter().position(|c| c == GROUP_COLUMN) else {
            let values: Vec<Value> = self.rows.iter().map(|r| r[value_idx].clone()).collect();
            let result = aggregate.apply(&values)?;
            return Ok(Table::from_parts(vec![column.to_string()], vec![vec![result]]));
        };

        // Group ids in first-encountered order, each with its values
        let mut order: Vec<(Value, Vec<Value>)> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        for row in &self.rows {
            let group = &row[group_idx];
            let slot = match index.entry(GroupKey::from(group)) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    order.push((group.clone(), Vec::new()));
                    *e.insert(order.len() - 1)
                }
            };
            order[slot].1.push(row[value_idx].clone());
        }

        // Summarizing the group column itself leaves one column holding the aggregate
        let by_group = value_idx != group_idx;
        let mut rows = Vec::with_capacity(order.len());
        for (group, values) in order {
            let result = aggregate.apply(&values)?;
            rows.push(if by_group { vec![group, result] } else { vec![result] });
        }
        let mut columns = vec![GROUP_COLUMN.to_string()];
        if by_group {
            columns.push(column.to_string());
        }
        Ok(Table::from_parts(columns, rows))
    }

    /// Inner equality join of two published tables.
    ///
    /// Each matching pair yields `_join_` followed by every other column of
    /// both sides, renamed `<table>_<column>`. Unmatched rows are dropped.
    /// Every pair of rows is compared; no index is built.
    ///
    /// When two renamed columns collide (a table joined with itself), the
    /// column keeps its first position and the right side's value wins.
    pub fn join<R: Resolver + ?Sized>(
        resolver: &R,
        left_name: &str,
        left_column: &str,
        right_name: &str,
        right_column: &str,
    ) -> TableResult<Table> {
        let left = resolver
            .resolve(left_name)
            .ok_or_else(|| TableError::UnknownTable {
                name: left_name.to_string(),
            })?;
        let left_key = left.column_index(left_column)?;
        let right = resolver
            .resolve(right_name)
            .ok_or_else(|| TableError::UnknownTable {
                name: right_name.to_string(),
            })?;
        let right_key = right.column_index(right_column)?;

        let mut columns = vec![JOIN_COLUMN.to_string()];
        let left_slots = renamed_slots(&mut columns, left, left_name, left_key);
        let right_slots = renamed_slots(&mut columns, right, right_name, right_key);

        let mut rows = Vec::new();
        for left_row in &left.rows {
            for right_row in &right.rows {
                let key = &left_row[left_key];
                if !key.strict_eq(&right_row[right_key]) {
                    continue;
                }
                // Every slot past the key is written by at least one side
                let mut values = vec![key.clone(); columns.len()];
                for &(from, to) in &left_slots {
                    values[to] = left_row[from].clone();
                }
                for &(from, to) in &right_slots {
                    values[to] = right_row[from].clone();
                }
                rows.push(values);
            }
        }
        Ok(Table::from_parts(columns, rows))
    }

    /// Parse the named columns into numbers, returning a new table.
    ///
    /// Text that does not start with a number becomes NaN.
    pub fn to_number<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Table> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<TableResult<Vec<usize>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut values = row.clone();
                for &i in &indices {
                    values[i] = Value::Number(values[i].to_number());
                }
                values
            })
            .collect();
        Ok(Table::from_parts(self.columns.clone(), rows))
    }

    /// Terminal step: hand this table to `publish` under `name`.
    pub fn notify<F>(self, publish: F, name: &str)
    where
        F: FnOnce(&str, Table),
    {
        publish(name, self)
    }

    /// Forward this table to the display sinks and return it for chaining.
    ///
    /// A plot spec that is not a JSON object fails before anything is
    /// displayed. The table sink always receives the rows. When a plot spec is given,
    /// the rows are stamped into its `data.values` slot and the stamped spec
    /// goes to the plot sink.
    pub fn plot(
        &self,
        sinks: &mut dyn Sinks,
        spec: Option<&serde_json::Value>,
    ) -> TableResult<&Self> {
        if let Some(spec) = spec {
            ensure(spec.is_object(), || {
                TableError::assertion(format!("Plot spec must be a JSON object, got {}", spec))
            })?;
        }
        sinks.display_table(self);
        if let Some(spec) = spec {
            sinks.display_plot(self.stamp_plot_spec(spec));
        }
        Ok(self)
    }

    /// Copy `spec` with this table's rows written into `data.values`.
    pub fn stamp_plot_spec(&self, spec: &serde_json::Value) -> serde_json::Value {
        let mut spec = spec.clone();
        if !spec.is_object() {
            spec = serde_json::Value::Object(serde_json::Map::new());
        }
        if let serde_json::Value::Object(map) = &mut spec {
            let data = map
                .entry("data")
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if !data.is_object() {
                *data = serde_json::Value::Object(serde_json::Map::new());
            }
            if let serde_json::Value::Object(data) = data {
                data.insert("values".to_string(), self.to_json());
            }
        }
        spec
    }
}

/// Place `<table>_<column>` for every column but `skip`, returning
/// `(source, output)` index pairs. A name already in `columns` reuses its slot.
fn renamed_slots(
    columns: &mut Vec<String>,
    table: &Table,
    table_name: &str,
    skip: usize,
) -> Vec<(usize, usize)> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(i, c)| {
            let name = format!("{}_{}", table_name, c);
            let slot = match columns.iter().position(|existing| *existing == name) {
                Some(slot) => slot,
                None => {
                    columns.push(name);
                    columns.len() - 1
                }
            };
            (i, slot)
        })
        .collect()
}
