//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use tidyblocks_rs::Table;

/// Build a table from a JSON array of records
pub fn table(value: serde_json::Value) -> Table {
    serde_json::from_value(value).expect("test table must be a valid array of records")
}

/// All values of a numeric column
pub fn numbers(table: &Table, column: &str) -> Vec<f64> {
    table
        .column(column)
        .expect("column exists")
        .iter()
        .map(|v| v.as_number().expect("numeric value"))
        .collect()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
