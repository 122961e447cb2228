//! Identity types for the pipeline system.

use std::fmt;

/// Registration handle of a pipeline within one [`Scheduler`](super::Scheduler).
///
/// Ids are handed out in registration order, so comparing two ids tells which
/// pipeline was registered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PipelineId(pub u32);

impl PipelineId {
    pub(crate) fn next(self) -> PipelineId {
        PipelineId(self.0 + 1)
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipeline #{}", self.0)
    }
}
