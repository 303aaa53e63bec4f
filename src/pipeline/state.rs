use std::fmt;

/// Run lifecycle. Only moves forward one step at a time; see [`PipelineState::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Queues allocated, pool and aggregator running, items being pushed.
    Dispatching,
    /// Work queue closed; waiting for every worker to exit.
    Draining,
    /// Workers gone, result queue closed; waiting for the aggregator to finish.
    Aggregating,
    Done,
}

impl PipelineState {
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineState::Idle => Some(PipelineState::Dispatching),
            PipelineState::Dispatching => Some(PipelineState::Draining),
            PipelineState::Draining => Some(PipelineState::Aggregating),
            PipelineState::Aggregating => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }

    /// Move to the next state and return it. `Done` stays `Done`.
    pub fn advance(&mut self) -> Self {
        if let Some(next) = self.next() {
            log::debug!("pipeline: {} -> {}", self, next);
            *self = next;
        }
        *self
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Dispatching => "dispatching",
            PipelineState::Draining => "draining",
            PipelineState::Aggregating => "aggregating",
            PipelineState::Done => "done",
        };
        f.write_str(s)
    }
}
