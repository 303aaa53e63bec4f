//! Typed errors at the pipeline seams. Application code wraps these in `anyhow`.

use std::fmt;
use thiserror::Error;

use crate::WorkItem;

/// Failure to retrieve one item's payload. Reported and skipped; never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("item not found: {0}")]
    NotFound(WorkItem),

    #[error("reading {item}: {source}")]
    Io {
        item: WorkItem,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Position of a fragment inside one payload. `offset` is the byte offset when the
/// format has one (newline-delimited input), None otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentRef {
    pub index: usize,
    pub offset: Option<usize>,
}

impl fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "fragment {} (byte {})", self.index, offset),
            None => write!(f, "fragment {}", self.index),
        }
    }
}

/// Failure to decode one fragment of a payload. The rest of the payload is still decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{at}: {message}")]
    Syntax { at: FragmentRef, message: String },

    #[error("{at}: not a JSON object")]
    NotAnObject { at: FragmentRef },

    #[error("{at}: missing key field `{field}`")]
    MissingKey { at: FragmentRef, field: String },
}

impl DecodeError {
    pub fn fragment(&self) -> FragmentRef {
        match self {
            DecodeError::Syntax { at, .. }
            | DecodeError::NotAnObject { at }
            | DecodeError::MissingKey { at, .. } => *at,
        }
    }

    /// Error text without the fragment position.
    pub fn reason(&self) -> String {
        match self {
            DecodeError::Syntax { message, .. } => message.clone(),
            DecodeError::NotAnObject { .. } => "not a JSON object".to_string(),
            DecodeError::MissingKey { field, .. } => format!("missing key field `{field}`"),
        }
    }
}

/// Conditions that stop a run before dispatch begins. The only errors `run` returns.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("failed to start {what}: {source}")]
    Spawn {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listing work items: {0:#}")]
    Source(anyhow::Error),

    #[error("aggregator thread exited before the result queue was drained")]
    AggregatorLost,
}
