//! Test to verify test infrastructure works correctly

mod common;

use common::builders::TableBuilder;
use serde_json::json;
use tidyblocks_rs::Value;

#[test]
fn test_infrastructure_setup() {
    let built = TableBuilder::new(["k", "v"])
        .row([Value::text("a"), Value::Number(1.0)])
        .build();
    let parsed = common::table(json!([{"k": "a", "v": 1}]));

    assert_eq!(built, parsed);
    assert_eq!(common::numbers(&parsed, "v"), vec![1.0]);
}

#[test]
fn test_counting_rows() {
    let table = TableBuilder::new(["id", "bucket"]).counting_rows(5, 2).build();
    assert_eq!(common::numbers(&table, "bucket"), vec![0.0, 1.0, 0.0, 1.0, 0.0]);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
