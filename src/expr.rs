//! Row expressions.
//!
//! An [`Expr`] computes one [`Value`] from one row. `mutate` stores the
//! result in a column and `filter` keeps the row when the result is truthy.
//!
//! Type contracts:
//!
//! - arithmetic and negation need numbers ([`TableError::NotNumber`]),
//! - comparisons need both operands of the same kind ([`TableError::TypeMismatch`]),
//! - logical operators coerce by truthiness and never fail on their own.
//!
//! Both operands of a binary expression are always evaluated, left first.

use crate::table::{ensure, RowRef, TableError, TableResult};
use crate::types::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gt,
    Geq,
    Eq,
    Neq,
    Leq,
    Lt,
}

/// Binary logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

/// A scalar expression evaluated against a single row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Value of a column in the current row
    Column { name: String },
    /// Numeric constant
    Number { value: f64 },
    /// Text constant
    Text { value: String },
    /// Boolean constant
    Bool { value: bool },
    /// Binary arithmetic on two numbers
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Numeric negation
    Negate { value: Box<Expr> },
    /// Comparison of two values of the same kind
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical conjunction or disjunction
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical negation
    Not { value: Box<Expr> },
    /// Type conversion
    Convert { to: ValueKind, value: Box<Expr> },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column { name: name.into() }
    }

    pub fn number(value: f64) -> Self {
        Expr::Number { value }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Text {
            value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Expr::Bool { value }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expr, right: Expr) -> Self {
        Expr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(value: Expr) -> Self {
        Expr::Negate {
            value: Box::new(value),
        }
    }

    pub fn not(value: Expr) -> Self {
        Expr::Not {
            value: Box::new(value),
        }
    }

    pub fn convert(to: ValueKind, value: Expr) -> Self {
        Expr::Convert {
            to,
            value: Box::new(value),
        }
    }

    /// Evaluate this expression against one row.
    pub fn eval(&self, row: RowRef<'_>) -> TableResult<Value> {
        match self {
            Expr::Column { name } => row.get(name).cloned(),
            Expr::Number { value } => Ok(Value::Number(*value)),
            Expr::Text { value } => Ok(Value::Text(value.clone())),
            Expr::Bool { value } => Ok(Value::Bool(*value)),
            Expr::Arithmetic { op, left, right } => {
                let left = require_number(left.eval(row)?)?;
                let right = require_number(right.eval(row)?)?;
                Ok(Value::Number(op.apply(left, right)))
            }
            Expr::Negate { value } => {
                let value = require_number(value.eval(row)?)?;
                Ok(Value::Number(-value))
            }
            Expr::Compare { op, left, right } => {
                let left = left.eval(row)?;
                let right = right.eval(row)?;
                op.apply(&left, &right).map(Value::Bool)
            }
            Expr::Logical { op, left, right } => {
                let left = left.eval(row)?.is_truthy();
                let right = right.eval(row)?.is_truthy();
                Ok(Value::Bool(match op {
                    LogicalOp::And => left && right,
                    LogicalOp::Or => left || right,
                }))
            }
            Expr::Not { value } => Ok(Value::Bool(!value.eval(row)?.is_truthy())),
            Expr::Convert { to, value } => {
                let value = value.eval(row)?;
                Ok(match to {
                    ValueKind::Number => Value::Number(value.to_number()),
                    ValueKind::Text => Value::Text(value.to_string()),
                    ValueKind::Bool => Value::Bool(value.is_truthy()),
                })
            }
        }
    }

    /// Names of all columns this expression reads
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column { name } => out.push(name),
            Expr::Number { .. } | Expr::Text { .. } | Expr::Bool { .. } => {}
            Expr::Arithmetic { left, right, .. }
            | Expr::Compare { left, right, .. }
            | Expr::Logical { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Negate { value } | Expr::Not { value } | Expr::Convert { value, .. } => {
                value.collect_columns(out)
            }
        }
    }
}

fn require_number(value: Value) -> TableResult<f64> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(TableError::NotNumber { value: other }),
    }
}

impl ArithmeticOp {
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            ArithmeticOp::Add => left + right,
            ArithmeticOp::Sub => left - right,
            ArithmeticOp::Mul => left * right,
            ArithmeticOp::Div => left / right,
            ArithmeticOp::Mod => left % right,
            ArithmeticOp::Pow => left.powf(right),
        }
    }
}

impl CompareOp {
    /// Compare two values of the same kind.
    ///
    /// Numbers follow IEEE comparison, so any comparison involving NaN is
    /// false except `Neq`.
    pub fn apply(self, left: &Value, right: &Value) -> TableResult<bool> {
        ensure(left.kind() == right.kind(), || {
            TableError::type_mismatch(left, right)
        })?;
        let ordering = match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            // Same kind, so this is the native text or boolean order
            _ => Some(left.sort_cmp(right)),
        };
        Ok(match ordering {
            None => self == CompareOp::Neq,
            Some(ord) => match self {
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Geq => ord != Ordering::Less,
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Neq => ord != Ordering::Equal,
                CompareOp::Leq => ord != Ordering::Greater,
                CompareOp::Lt => ord == Ordering::Less,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn table() -> Table {
        Table::new(
            vec!["n".into(), "m".into(), "s".into(), "b".into()],
            vec![vec![
                Value::Number(7.0),
                Value::Number(2.0),
                Value::text("hi"),
                Value::Bool(false),
            ]],
        )
        .unwrap()
    }

    fn eval(expr: &Expr) -> TableResult<Value> {
        let t = table();
        let row = t.row(0).unwrap();
        expr.eval(row)
    }

    fn arith(op: ArithmeticOp) -> f64 {
        eval(&Expr::arithmetic(op, Expr::column("n"), Expr::column("m")))
            .unwrap()
            .as_number()
            .unwrap()
    }

    #[test]
    fn test_arithmetic_ops() {
        assert_eq!(arith(ArithmeticOp::Add), 9.0);
        assert_eq!(arith(ArithmeticOp::Sub), 5.0);
        assert_eq!(arith(ArithmeticOp::Mul), 14.0);
        assert_eq!(arith(ArithmeticOp::Div), 3.5);
        assert_eq!(arith(ArithmeticOp::Mod), 1.0);
        assert_eq!(arith(ArithmeticOp::Pow), 49.0);
    }

    #[test]
    fn test_arithmetic_requires_numbers() {
        let err = eval(&Expr::arithmetic(
            ArithmeticOp::Add,
            Expr::column("n"),
            Expr::column("s"),
        ))
        .unwrap_err();
        assert_eq!(
            err,
            TableError::NotNumber {
                value: Value::text("hi")
            }
        );
    }

    #[test]
    fn test_divide_by_zero_is_infinite() {
        let v = eval(&Expr::arithmetic(
            ArithmeticOp::Div,
            Expr::number(1.0),
            Expr::number(0.0),
        ))
        .unwrap();
        assert_eq!(v, Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_compare_same_kind() {
        let gt = Expr::compare(CompareOp::Gt, Expr::column("n"), Expr::column("m"));
        assert_eq!(eval(&gt).unwrap(), Value::Bool(true));
        let eq = Expr::compare(CompareOp::Eq, Expr::column("s"), Expr::text("hi"));
        assert_eq!(eval(&eq).unwrap(), Value::Bool(true));
        let leq = Expr::compare(CompareOp::Leq, Expr::bool(true), Expr::column("b"));
        assert_eq!(eval(&leq).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_convert_large_number_to_text() {
        let v = eval(&Expr::convert(ValueKind::Text, Expr::number(1e20))).unwrap();
        assert_eq!(v, Value::text("100000000000000000000"));
    }

    #[test]
    fn test_compare_type_mismatch() {
        let expr = Expr::compare(CompareOp::Eq, Expr::column("n"), Expr::text("7"));
        assert!(matches!(
            eval(&expr),
            Err(TableError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_compare_nan() {
        let nan = Expr::number(f64::NAN);
        let eq = Expr::compare(CompareOp::Eq, nan.clone(), nan.clone());
        let neq = Expr::compare(CompareOp::Neq, nan.clone(), nan);
        assert_eq!(eval(&eq).unwrap(), Value::Bool(false));
        assert_eq!(eval(&neq).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_logical_coerces() {
        let and = Expr::logical(LogicalOp::And, Expr::column("n"), Expr::column("s"));
        assert_eq!(eval(&and).unwrap(), Value::Bool(true));
        let or = Expr::logical(LogicalOp::Or, Expr::column("b"), Expr::number(0.0));
        assert_eq!(eval(&or).unwrap(), Value::Bool(false));
        assert_eq!(
            eval(&Expr::not(Expr::column("b"))).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_logical_still_fails_on_missing_column() {
        let or = Expr::logical(LogicalOp::Or, Expr::bool(true), Expr::column("nope"));
        assert!(matches!(eval(&or), Err(TableError::MissingColumn { .. })));
    }

    #[test]
    fn test_negate_and_convert() {
        assert_eq!(
            eval(&Expr::negate(Expr::column("m"))).unwrap(),
            Value::Number(-2.0)
        );
        assert_eq!(
            eval(&Expr::convert(ValueKind::Text, Expr::column("n"))).unwrap(),
            Value::text("7")
        );
        assert_eq!(
            eval(&Expr::convert(ValueKind::Number, Expr::text("12.5%"))).unwrap(),
            Value::Number(12.5)
        );
        assert_eq!(
            eval(&Expr::convert(ValueKind::Bool, Expr::column("s"))).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_columns_lists_reads() {
        let expr = Expr::logical(
            LogicalOp::And,
            Expr::compare(CompareOp::Gt, Expr::column("a"), Expr::number(1.0)),
            Expr::not(Expr::column("b")),
        );
        assert_eq!(expr.columns(), vec!["a", "b"]);
    }

    #[test]
    fn test_serde_shape() {
        let expr = Expr::arithmetic(ArithmeticOp::Add, Expr::column("a"), Expr::number(1.0));
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "arithmetic",
                "op": "add",
                "left": {"kind": "column", "name": "a"},
                "right": {"kind": "number", "value": 1.0}
            })
        );
    }
}
