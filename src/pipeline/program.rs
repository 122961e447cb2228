//! Programs as data.
//!
//! A [`Program`] is an ordered list of [`Pipeline`]s; a pipeline is an
//! optional list of dependency names plus an ordered list of [`Step`]s. Every
//! step is a plain descriptor carrying its typed arguments, so a program can
//! be serialized, inspected and validated before anything runs.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "pipelines": [
//!     {
//!       "steps": [
//!         {"kind": "load", "dataset": "colors"},
//!         {"kind": "filter", "expr": {"kind": "compare", "op": "gt",
//!           "left": {"kind": "column", "name": "red"},
//!           "right": {"kind": "number", "value": 0}}},
//!         {"kind": "notify", "name": "reds"}
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::{Result, TidyError};
use crate::expr::Expr;
use crate::table::Aggregate;
use serde::{Deserialize, Serialize};

/// One operator call within a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Start from a named dataset
    Load { dataset: String },

    /// Add or overwrite a column computed per row
    Mutate { column: String, expr: Expr },

    /// Keep rows whose predicate is truthy
    Filter { expr: Expr },

    /// Project to the named columns
    Select { columns: Vec<String> },

    /// Tag rows with a group id
    GroupBy { column: String },

    /// Drop the group tag
    Ungroup,

    /// Stable ascending sort
    Sort { columns: Vec<String> },

    /// Reverse row order
    Reverse,

    /// Aggregate one column (per group if grouped)
    Summarize { aggregate: Aggregate, column: String },

    /// Start from the inner join of two published tables
    Join {
        left_table: String,
        left_column: String,
        right_table: String,
        right_column: String,
    },

    /// Parse the named columns to numbers
    ToNumber { columns: Vec<String> },

    /// Publish under a name; terminal
    Notify { name: String },

    /// Display the table and, with a spec, a plot
    Plot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spec: Option<serde_json::Value>,
    },
}

impl Step {
    /// Snake-case name of the step, as it appears in JSON
    pub fn name(&self) -> &'static str {
        match self {
            Step::Load { .. } => "load",
            Step::Mutate { .. } => "mutate",
            Step::Filter { .. } => "filter",
            Step::Select { .. } => "select",
            Step::GroupBy { .. } => "group_by",
            Step::Ungroup => "ungroup",
            Step::Sort { .. } => "sort",
            Step::Reverse => "reverse",
            Step::Summarize { .. } => "summarize",
            Step::Join { .. } => "join",
            Step::ToNumber { .. } => "to_number",
            Step::Notify { .. } => "notify",
            Step::Plot { .. } => "plot",
        }
    }

    /// Publish or display step
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Notify { .. } | Step::Plot { .. })
    }
}

/// A chain of steps, optionally waiting on other pipelines' published tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `name` to be published before running.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.depends_on.contains(&name) {
            self.depends_on.push(name);
        }
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn load(self, dataset: impl Into<String>) -> Self {
        self.step(Step::Load {
            dataset: dataset.into(),
        })
    }

    pub fn mutate(self, column: impl Into<String>, expr: Expr) -> Self {
        self.step(Step::Mutate {
            column: column.into(),
            expr,
        })
    }

    pub fn filter(self, expr: Expr) -> Self {
        self.step(Step::Filter { expr })
    }

    pub fn select<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.step(Step::Select {
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    pub fn group_by(self, column: impl Into<String>) -> Self {
        self.step(Step::GroupBy {
            column: column.into(),
        })
    }

    pub fn ungroup(self) -> Self {
        self.step(Step::Ungroup)
    }

    pub fn sort<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.step(Step::Sort {
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    pub fn reverse(self) -> Self {
        self.step(Step::Reverse)
    }

    pub fn summarize(self, aggregate: Aggregate, column: impl Into<String>) -> Self {
        self.step(Step::Summarize {
            aggregate,
            column: column.into(),
        })
    }

    /// Join two published tables. Both names become dependencies.
    pub fn join(
        self,
        left_table: impl Into<String>,
        left_column: impl Into<String>,
        right_table: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        let left_table = left_table.into();
        let right_table = right_table.into();
        self.depends_on(left_table.clone())
            .depends_on(right_table.clone())
            .step(Step::Join {
                left_table,
                left_column: left_column.into(),
                right_table,
                right_column: right_column.into(),
            })
    }

    pub fn to_number<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.step(Step::ToNumber {
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    pub fn notify(self, name: impl Into<String>) -> Self {
        self.step(Step::Notify { name: name.into() })
    }

    pub fn plot(self, spec: Option<serde_json::Value>) -> Self {
        self.step(Step::Plot { spec })
    }

    /// True if the last step publishes or displays
    pub fn is_terminated(&self) -> bool {
        self.steps.last().is_some_and(Step::is_terminal)
    }

    /// Append the default terminator (table display only) if needed.
    pub fn terminate(&mut self) {
        if !self.is_terminated() {
            self.steps.push(Step::Plot { spec: None });
        }
    }

    /// Column names the steps refer to, in first-mention order.
    ///
    /// Join keys are included even though they name columns of other tables.
    pub fn columns_read(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for step in &self.steps {
            let names: Vec<&str> = match step {
                Step::Mutate { expr, .. } | Step::Filter { expr } => expr.columns(),
                Step::Select { columns } | Step::Sort { columns } | Step::ToNumber { columns } => {
                    columns.iter().map(String::as_str).collect()
                }
                Step::GroupBy { column } | Step::Summarize { column, .. } => vec![column.as_str()],
                Step::Join {
                    left_column,
                    right_column,
                    ..
                } => vec![left_column.as_str(), right_column.as_str()],
                Step::Load { .. }
                | Step::Ungroup
                | Step::Reverse
                | Step::Notify { .. }
                | Step::Plot { .. } => Vec::new(),
            };
            for name in names {
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Name this pipeline publishes under, if any
    pub fn publishes(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            Step::Notify { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Structural checks that don't need any data.
    ///
    /// `Notify` consumes the table, so it must be the last step.
    pub fn validate(&self) -> Result<()> {
        let last = self.steps.len().saturating_sub(1);
        for (i, step) in self.steps.iter().enumerate() {
            if let Step::Notify { name } = step {
                if i != last {
                    return Err(TidyError::Program(format!(
                        "notify '{}' must be the last step (found at step {} of {})",
                        name,
                        i + 1,
                        self.steps.len()
                    )));
                }
                if name.is_empty() {
                    return Err(TidyError::Program(
                        "notify needs a non-empty name".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// An ordered list of pipelines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub pipelines: Vec<Pipeline>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pipeline: Pipeline) -> Self {
        self.pipelines.push(pipeline);
        self
    }

    pub fn push(&mut self, pipeline: Pipeline) {
        self.pipelines.push(pipeline);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Parse a program from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Program = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every pipeline, naming the first offender.
    pub fn validate(&self) -> Result<()> {
        for (i, pipeline) in self.pipelines.iter().enumerate() {
            pipeline
                .validate()
                .map_err(|e| e.with_context(format!("pipeline {}", i)))?;
        }
        Ok(())
    }

    /// Append the default terminator to every unterminated pipeline.
    pub fn terminate_all(&mut self) {
        for pipeline in &mut self.pipelines {
            pipeline.terminate();
        }
    }
}
