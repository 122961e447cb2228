//! Interpreter for a single pipeline.
//!
//! The executor walks a pipeline's steps in order, threading one [`Table`]
//! through them. It reads datasets and published tables but never writes
//! scheduler state: a `Notify` step ends execution and hands its
//! [`Publication`] back to the caller, which decides what becomes ready.

use super::catalog::Datasets;
use super::id::PipelineId;
use super::program::{Pipeline, Step};
use super::sink::Sinks;
use crate::error::{Result, TidyError};
use crate::table::Table;
use std::collections::HashMap;

/// A table published by a `Notify` step
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub name: String,
    pub table: Table,
}

pub struct Executor<'a> {
    datasets: &'a Datasets,
    published: &'a HashMap<String, Table>,
}

impl<'a> Executor<'a> {
    pub fn new(datasets: &'a Datasets, published: &'a HashMap<String, Table>) -> Self {
        Self {
            datasets,
            published,
        }
    }

    /// Run every step of `pipeline`. The first failing step aborts.
    pub fn execute(
        &self,
        id: PipelineId,
        pipeline: &Pipeline,
        sinks: &mut dyn Sinks,
    ) -> Result<Option<Publication>> {
        pipeline.validate()?;

        // Pipelines that don't start with load/join start from nothing
        let mut table = Table::default();

        for (index, step) in pipeline.steps.iter().enumerate() {
            tracing::trace!(
                "{} step {} ({}) on {} rows",
                id,
                index,
                step.name(),
                table.row_count()
            );

            table = match step {
                Step::Load { dataset } => self
                    .datasets
                    .get(dataset)
                    .cloned()
                    .ok_or_else(|| TidyError::Program(format!("No dataset named {}", dataset)))?,
                Step::Mutate { column, expr } => table.mutate(column, expr)?,
                Step::Filter { expr } => table.filter(expr)?,
                Step::Select { columns } => table.select(columns)?,
                Step::GroupBy { column } => table.group_by(column)?,
                Step::Ungroup => table.ungroup()?,
                Step::Sort { columns } => table.sort(columns)?,
                Step::Reverse => table.reverse(),
                Step::Summarize { aggregate, column } => table.summarize(*aggregate, column)?,
                Step::Join {
                    left_table,
                    left_column,
                    right_table,
                    right_column,
                } => Table::join(
                    self.published,
                    left_table,
                    left_column,
                    right_table,
                    right_column,
                )?,
                Step::ToNumber { columns } => table.to_number(columns)?,
                Step::Notify { name } => {
                    let mut publication = None;
                    table.notify(
                        |name, table| {
                            publication = Some(Publication {
                                name: name.to_string(),
                                table,
                            })
                        },
                        name,
                    );
                    return Ok(publication);
                }
                Step::Plot { spec } => {
                    table.plot(sinks, spec.as_ref())?;
                    table
                }
            };
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CompareOp, Expr};
    use crate::pipeline::sink::CollectingSinks;
    use crate::table::{Aggregate, TableError};
    use serde_json::json;

    fn datasets() -> Datasets {
        let table: Table = serde_json::from_value(json!([
            {"k": "b", "v": 1},
            {"k": "a", "v": 2},
            {"k": "b", "v": 3}
        ]))
        .unwrap();
        Datasets::new().with("kv", table)
    }

    #[test]
    fn test_execute_chain_and_publish() {
        let datasets = datasets();
        let published = HashMap::new();
        let mut sinks = CollectingSinks::new();
        let pipeline = Pipeline::new()
            .load("kv")
            .group_by("k")
            .summarize(Aggregate::Sum, "v")
            .notify("totals");

        let publication = Executor::new(&datasets, &published)
            .execute(PipelineId(0), &pipeline, &mut sinks)
            .unwrap()
            .unwrap();
        assert_eq!(publication.name, "totals");
        assert_eq!(
            publication.table.to_json(),
            json!([{"_group_": 0.0, "v": 4.0}, {"_group_": 1.0, "v": 2.0}])
        );
        assert!(sinks.is_empty());
    }

    #[test]
    fn test_plot_displays_and_continues() {
        let datasets = datasets();
        let published = HashMap::new();
        let mut sinks = CollectingSinks::new();
        let pipeline = Pipeline::new()
            .load("kv")
            .plot(None)
            .select(["v"])
            .plot(Some(json!({"mark": "bar"})));

        let publication = Executor::new(&datasets, &published)
            .execute(PipelineId(0), &pipeline, &mut sinks)
            .unwrap();
        assert!(publication.is_none());
        assert_eq!(sinks.tables.len(), 2);
        assert_eq!(sinks.tables[1].columns(), &["v"]);
        assert_eq!(sinks.plots[0]["data"]["values"][2], json!({"v": 3.0}));
    }

    #[test]
    fn test_failing_step_stops_execution() {
        let datasets = datasets();
        let published = HashMap::new();
        let mut sinks = CollectingSinks::new();
        let pipeline = Pipeline::new()
            .load("kv")
            .filter(Expr::compare(
                CompareOp::Eq,
                Expr::column("missing"),
                Expr::number(1.0),
            ))
            .plot(None);

        let err = Executor::new(&datasets, &published)
            .execute(PipelineId(0), &pipeline, &mut sinks)
            .unwrap_err();
        assert!(matches!(
            err.table_error(),
            Some(TableError::MissingColumn { .. })
        ));
        assert!(sinks.tables.is_empty());
    }

    #[test]
    fn test_unknown_dataset() {
        let datasets = Datasets::new();
        let published = HashMap::new();
        let pipeline = Pipeline::new().load("nope");
        let err = Executor::new(&datasets, &published)
            .execute(PipelineId(0), &pipeline, &mut CollectingSinks::new())
            .unwrap_err();
        assert!(matches!(err, TidyError::Program(_)));
    }

    #[test]
    fn test_join_reads_published_tables() {
        let datasets = Datasets::new();
        let mut published = HashMap::new();
        published.insert(
            "left".to_string(),
            serde_json::from_value(json!([{"id": 1, "v": "x"}])).unwrap(),
        );
        published.insert(
            "right".to_string(),
            serde_json::from_value(json!([{"id": 1, "w": "y"}])).unwrap(),
        );
        let pipeline = Pipeline::new()
            .join("left", "id", "right", "id")
            .notify("both");

        let publication = Executor::new(&datasets, &published)
            .execute(PipelineId(3), &pipeline, &mut CollectingSinks::new())
            .unwrap()
            .unwrap();
        assert_eq!(
            publication.table.to_json(),
            json!([{"_join_": 1.0, "left_v": "x", "right_w": "y"}])
        );
    }
}
