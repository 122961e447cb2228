//! Pipelines, their interpreter and the scheduler that orders them.
//!
//! A [`Program`] is data: each [`Pipeline`] lists the names it depends on and
//! the [`Step`]s to apply. The [`Scheduler`] registers every pipeline, runs
//! the ready ones one at a time through the [`Executor`], and releases
//! dependents as `notify` steps publish tables.
//!
//! # Architecture
//!
//! ```text
//! Program ──► Scheduler::run ──► ready queue ──► Executor ──► Table ops
//!                  ▲                                 │
//!                  └────────── notify(name) ◄────────┤
//!                                                    └──► Sinks (table / plot / error)
//! ```
//!
//! # Design
//!
//! - **Single-threaded** - one pipeline at a time, each run to completion.
//! - **Fail fast** - the first error aborts the run and reaches the error sink once.
//! - **Explicit instance** - scheduler state lives in a value, cleared by `reset`.

pub mod catalog;
pub mod executor;
pub mod id;
pub mod program;
pub mod scheduler;
pub mod sink;

pub use catalog::Datasets;
pub use executor::{Executor, Publication};
pub use id::PipelineId;
pub use program::{Pipeline, Program, Step};
pub use scheduler::{RunReport, Scheduler};
pub use sink::{CallbackSinks, ChannelSinks, CollectingSinks, NullSinks, SinkMessage, Sinks};
