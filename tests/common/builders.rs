//! Test data builders for creating test objects

use tidyblocks_rs::{Table, Value};

/// Builder for creating test Tables column by column
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableBuilder {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Append `n` rows of `(i, i % modulo)` for numeric two-column tables
    pub fn counting_rows(mut self, n: usize, modulo: usize) -> Self {
        for i in 0..n {
            self.rows
                .push(vec![Value::from(i as f64), Value::from((i % modulo) as f64)]);
        }
        self
    }

    pub fn build(self) -> Table {
        Table::new(self.columns, self.rows).expect("builder rows must match the schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new(["a", "b"])
            .row([1.0, 2.0])
            .row([3.0, 4.0])
            .build();

        assert_eq!(table.columns(), &["a", "b"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(1, "b"), Some(&Value::Number(4.0)));
    }
}
