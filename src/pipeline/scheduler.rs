//! Dependency-driven pipeline scheduler.
//!
//! Pipelines move through four states:
//!
//! ```text
//! WAITING ──(last dependency notified)──► READY ──(dequeued)──► RUNNING ──► DONE
//! ```
//!
//! Dependencies are discovered as pipelines publish, not computed up front,
//! so draining the ready queue is a Kahn-style topological walk over a graph
//! whose edges appear during the run. A pipeline whose dependencies are never
//! published (a cycle, or a name nobody notifies) simply stays waiting; the
//! scheduler logs it once the queue is empty.
//!
//! # Ordering
//!
//! - The ready queue is FIFO.
//! - When one `notify` releases several pipelines, they are enqueued in
//!   registration order.
//!
//! # Failure
//!
//! The first failing pipeline aborts the whole run. The error goes to the
//! error sink exactly once; queued and waiting pipelines are abandoned.

use super::catalog::Datasets;
use super::executor::{Executor, Publication};
use super::id::PipelineId;
use super::program::{Pipeline, Program};
use super::sink::Sinks;
use crate::config::Settings;
use crate::error::Result;
use crate::table::Table;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Outcome of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Pipelines executed to completion
    pub executed: usize,
    /// Pipelines still waiting on unpublished names when the queue drained
    pub stalled: usize,
}

/// A registered pipeline that still has unpublished dependencies
#[derive(Debug)]
struct Waiting {
    pending: BTreeSet<String>,
    pipeline: Pipeline,
}

#[derive(Debug)]
pub struct Scheduler {
    next_id: PipelineId,
    ready: VecDeque<(PipelineId, Pipeline)>,
    // BTreeMap keyed by id keeps registration order
    waiting: BTreeMap<PipelineId, Waiting>,
    published: HashMap<String, Table>,
    datasets: Datasets,
    auto_terminate: bool,
    warn_on_stall: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            next_id: PipelineId::default(),
            ready: VecDeque::new(),
            waiting: BTreeMap::new(),
            published: HashMap::new(),
            datasets: Datasets::new(),
            auto_terminate: settings.auto_terminate,
            warn_on_stall: settings.warn_on_stall,
        }
    }

    /// Use `datasets` as the source for `load` steps.
    pub fn with_datasets(mut self, datasets: Datasets) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    /// Register a pipeline that runs once every name in `depends` is notified.
    ///
    /// With no dependencies the pipeline is ready at once. Names already
    /// published before this call still count as pending; only a later
    /// `notify` satisfies them.
    pub fn register<I, S>(&mut self, depends: I, pipeline: Pipeline) -> PipelineId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.next_id;
        self.next_id = id.next();

        let pending: BTreeSet<String> = depends.into_iter().map(Into::into).collect();
        if pending.is_empty() {
            tracing::debug!("Registered {} as ready", id);
            self.ready.push_back((id, pipeline));
        } else {
            tracing::debug!("Registered {} waiting on {:?}", id, pending);
            self.waiting.insert(id, Waiting { pending, pipeline });
        }
        id
    }

    /// Publish `table` under `name` and release pipelines waiting on it.
    ///
    /// Re-publishing a name replaces the earlier table.
    pub fn notify(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        tracing::debug!("Published '{}' ({} rows)", name, table.row_count());
        if self.published.insert(name.clone(), table).is_some() {
            tracing::debug!("'{}' replaced an earlier table", name);
        }

        let released: Vec<PipelineId> = self
            .waiting
            .iter_mut()
            .filter_map(|(id, waiting)| {
                waiting.pending.remove(&name);
                waiting.pending.is_empty().then_some(*id)
            })
            .collect();

        for id in released {
            if let Some(waiting) = self.waiting.remove(&id) {
                tracing::debug!("{} is ready", id);
                self.ready.push_back((id, waiting.pipeline));
            }
        }
    }

    /// Obtain a program, register its pipelines and run until nothing is ready.
    ///
    /// Failures (including failing to obtain the program) are reported to
    /// `sinks` once and returned.
    pub fn run<F>(&mut self, get_program: F, sinks: &mut dyn Sinks) -> Result<RunReport>
    where
        F: FnOnce() -> Result<Program>,
    {
        tracing::info!("Run started");
        match self.run_to_completion(get_program, sinks) {
            Ok(report) => {
                tracing::info!(
                    "Run finished: {} executed, {} stalled",
                    report.executed,
                    report.stalled
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Run aborted: {}", e);
                self.abandon();
                sinks.display_error(&e);
                Err(e)
            }
        }
    }

    fn run_to_completion<F>(&mut self, get_program: F, sinks: &mut dyn Sinks) -> Result<RunReport>
    where
        F: FnOnce() -> Result<Program>,
    {
        let mut program = get_program()?;
        program.validate()?;
        if self.auto_terminate {
            program.terminate_all();
        }

        for pipeline in program.pipelines {
            let depends = pipeline.depends_on.clone();
            self.register(depends, pipeline);
        }

        let mut executed = 0;
        while let Some((id, pipeline)) = self.ready.pop_front() {
            tracing::debug!("Running {}", id);
            let publication =
                Executor::new(&self.datasets, &self.published).execute(id, &pipeline, sinks)?;
            executed += 1;
            if let Some(Publication { name, table }) = publication {
                self.notify(name, table);
            }
        }

        let stalled = self.waiting.len();
        if stalled > 0 && self.warn_on_stall {
            for (id, waiting) in &self.waiting {
                tracing::warn!(
                    "{} never ran: still waiting on {:?}",
                    id,
                    waiting.pending
                );
            }
        }

        Ok(RunReport { executed, stalled })
    }

    fn abandon(&mut self) {
        let abandoned = self.ready.len() + self.waiting.len();
        if abandoned > 0 {
            tracing::debug!("Abandoning {} pipelines", abandoned);
        }
        self.ready.clear();
        self.waiting.clear();
    }

    /// Clear the queue, the waiting pipelines and all published tables.
    ///
    /// Datasets are inputs, not run state, and are kept.
    pub fn reset(&mut self) {
        tracing::debug!("Scheduler reset");
        self.next_id = PipelineId::default();
        self.ready.clear();
        self.waiting.clear();
        self.published.clear();
    }

    /// The table published under `name`, if any
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.published.get(name)
    }

    /// Names of all published tables, sorted
    pub fn published_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.published.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    /// Dependencies a waiting pipeline is still missing
    pub fn pending_for(&self, id: PipelineId) -> Option<Vec<&str>> {
        self.waiting
            .get(&id)
            .map(|w| w.pending.iter().map(String::as_str).collect())
    }
}
