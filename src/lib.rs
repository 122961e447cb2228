//! # tidyblocks-rs: dependency-scheduled table pipelines
//!
//! Users describe named data-transformation pipelines (filter, mutate, group,
//! summarize, join, ...) that may consume each other's published tables. The
//! crate runs them once each, in dependency order, and hands the results to
//! display sinks.
//!
//! ## Architecture
//!
//! - **Table**: immutable in-memory relational table with an explicit schema
//!   ([`table`], [`types`])
//! - **Operators**: row expressions and table operators that always return new
//!   tables ([`expr`], [`table::ops`], [`table::aggregate`])
//! - **Programs**: pipelines as serializable data ([`pipeline::program`])
//! - **Scheduler**: dependency-driven FIFO execution with fail-fast errors
//!   ([`pipeline::scheduler`])
//! - **Sinks**: closure, channel and collecting display targets
//!   ([`pipeline::sink`])
//!
//! ## Example
//!
//! ```ignore
//! use tidyblocks_rs::{
//!     expr::{CompareOp, Expr},
//!     pipeline::{CollectingSinks, Datasets, Pipeline, Program, Scheduler},
//!     table::Aggregate,
//! };
//!
//! let mut scheduler = Scheduler::new().with_datasets(Datasets::new().with("colors", colors));
//! let program = Program::new()
//!     .with(
//!         Pipeline::new()
//!             .load("colors")
//!             .filter(Expr::compare(CompareOp::Gt, Expr::column("red"), Expr::number(0.0)))
//!             .notify("reds"),
//!     )
//!     .with(
//!         Pipeline::new()
//!             .depends_on("reds")
//!             .join("reds", "name", "colors", "name")
//!             .summarize(Aggregate::Count, "_join_"),
//!     );
//!
//! let mut sinks = CollectingSinks::new();
//! let report = scheduler.run(|| Ok(program), &mut sinks)?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod pipeline;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use config::Settings;
pub use error::{Result, TidyError};
pub use expr::Expr;
pub use pipeline::{Pipeline, Program, RunReport, Scheduler, Sinks};
pub use table::{Aggregate, Table, TableError};
pub use types::{Value, ValueKind};
