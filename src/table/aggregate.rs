//! Aggregation functions for `summarize`.
//!
//! Each aggregate reduces a column's values to one number. `Count` accepts
//! values of any kind; every other aggregate requires numbers and fails with
//! [`TableError::NotNumber`] on the first non-numeric value.
//!
//! Empty input gives NaN for everything except `Count` and `Sum`, which give 0.

use super::error::{TableError, TableResult};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation operation applied by `summarize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// Number of values
    Count,
    /// Total
    Sum,
    /// Arithmetic mean
    Mean,
    /// Middle order statistic (mean of the middle pair for even counts)
    Median,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Population standard deviation
    Std,
}

impl Aggregate {
    /// All supported aggregates
    pub const ALL: [Aggregate; 7] = [
        Aggregate::Count,
        Aggregate::Sum,
        Aggregate::Mean,
        Aggregate::Median,
        Aggregate::Min,
        Aggregate::Max,
        Aggregate::Std,
    ];

    /// Reduce `values` to a single summary value.
    pub fn apply(self, values: &[Value]) -> TableResult<Value> {
        if self == Aggregate::Count {
            return Ok(Value::Number(values.len() as f64));
        }

        let numbers = values
            .iter()
            .map(|v| {
                v.as_number()
                    .ok_or_else(|| TableError::NotNumber { value: v.clone() })
            })
            .collect::<TableResult<Vec<f64>>>()?;

        let result = match self {
            Aggregate::Count => numbers.len() as f64,
            Aggregate::Sum => numbers.iter().sum(),
            Aggregate::Mean => mean(&numbers),
            Aggregate::Median => median(numbers),
            Aggregate::Min => numbers
                .iter()
                .copied()
                .reduce(|so_far, v| if v < so_far { v } else { so_far })
                .unwrap_or(f64::NAN),
            Aggregate::Max => numbers
                .iter()
                .copied()
                .reduce(|so_far, v| if v > so_far { v } else { so_far })
                .unwrap_or(f64::NAN),
            Aggregate::Std => std_dev(&numbers),
        };
        Ok(Value::Number(result))
    }

    /// Lowercase name, as used in serialized programs
    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Median => "median",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Std => "std",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn mean(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return f64::NAN;
    }
    numbers.iter().sum::<f64>() / numbers.len() as f64
}

fn median(mut numbers: Vec<f64>) -> f64 {
    if numbers.is_empty() {
        return f64::NAN;
    }
    numbers.sort_by(f64::total_cmp);
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        numbers[mid]
    } else {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    }
}

fn std_dev(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return f64::NAN;
    }
    let m = mean(numbers);
    let variance = numbers.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / numbers.len() as f64;
    variance.sqrt()
}
