//! Display sinks.
//!
//! The scheduler never renders anything itself. Tables, plot specs and the
//! run's error are handed to a [`Sinks`] implementation, synchronously and on
//! the calling thread.

use crate::error::TidyError;
use crate::table::Table;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Receivers for everything a run displays. All methods default to no-ops.
#[cfg_attr(test, mockall::automock)]
pub trait Sinks {
    /// A pipeline rendered a table
    fn display_table(&mut self, _table: &Table) {}

    /// A pipeline rendered a plot; `spec` already carries the rows in `data.values`
    fn display_plot(&mut self, _spec: serde_json::Value) {}

    /// The run failed. Called at most once per run.
    fn display_error(&mut self, _error: &TidyError) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSinks;

impl Sinks for NullSinks {}

type TableCallback<'a> = Box<dyn FnMut(&Table) + 'a>;
type PlotCallback<'a> = Box<dyn FnMut(serde_json::Value) + 'a>;
type ErrorCallback<'a> = Box<dyn FnMut(&TidyError) + 'a>;

/// Sinks backed by optional closures
#[derive(Default)]
pub struct CallbackSinks<'a> {
    on_table: Option<TableCallback<'a>>,
    on_plot: Option<PlotCallback<'a>>,
    on_error: Option<ErrorCallback<'a>>,
}

impl<'a> CallbackSinks<'a> {
    pub fn new() -> Self {
        Self {
            on_table: None,
            on_plot: None,
            on_error: None,
        }
    }

    pub fn on_table(mut self, f: impl FnMut(&Table) + 'a) -> Self {
        self.on_table = Some(Box::new(f));
        self
    }

    pub fn on_plot(mut self, f: impl FnMut(serde_json::Value) + 'a) -> Self {
        self.on_plot = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&TidyError) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl Sinks for CallbackSinks<'_> {
    fn display_table(&mut self, table: &Table) {
        if let Some(f) = self.on_table.as_mut() {
            f(table);
        }
    }

    fn display_plot(&mut self, spec: serde_json::Value) {
        if let Some(f) = self.on_plot.as_mut() {
            f(spec);
        }
    }

    fn display_error(&mut self, error: &TidyError) {
        if let Some(f) = self.on_error.as_mut() {
            f(error);
        }
    }
}

/// Messages sent from a [`ChannelSinks`] to whoever renders them.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkMessage {
    /// A displayed table.
    Table(Table),

    /// A stamped plot spec.
    Plot(serde_json::Value),

    /// The run's error, rendered to text.
    Error(String),
}

/// Sinks that forward everything over a crossbeam channel.
///
/// The channel is unbounded: a run executes on the caller's thread, so a
/// bounded channel drained only after `run` returns could block forever.
#[derive(Debug, Clone)]
pub struct ChannelSinks {
    tx: Sender<SinkMessage>,
}

impl ChannelSinks {
    /// Create the sinks together with the receiving end.
    pub fn new() -> (Self, Receiver<SinkMessage>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// Drain all pending messages from a receiver.
    pub fn drain(rx: &Receiver<SinkMessage>) -> Vec<SinkMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn send(&self, msg: SinkMessage) {
        if self.tx.send(msg).is_err() {
            tracing::warn!("Sink receiver dropped, discarding display message");
        }
    }
}

impl Sinks for ChannelSinks {
    fn display_table(&mut self, table: &Table) {
        self.send(SinkMessage::Table(table.clone()));
    }

    fn display_plot(&mut self, spec: serde_json::Value) {
        self.send(SinkMessage::Plot(spec));
    }

    fn display_error(&mut self, error: &TidyError) {
        self.send(SinkMessage::Error(error.to_string()));
    }
}

/// Sinks that keep everything they receive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectingSinks {
    pub tables: Vec<Table>,
    pub plots: Vec<serde_json::Value>,
    pub errors: Vec<String>,
}

impl CollectingSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing at all was displayed
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.plots.is_empty() && self.errors.is_empty()
    }
}

impl Sinks for CollectingSinks {
    fn display_table(&mut self, table: &Table) {
        self.tables.push(table.clone());
    }

    fn display_plot(&mut self, spec: serde_json::Value) {
        self.plots.push(spec);
    }

    fn display_error(&mut self, error: &TidyError) {
        self.errors.push(error.to_string());
    }
}
