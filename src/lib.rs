//! Fanpipe: bounded worker-pool fan-out/fan-in pipeline with a clean drain shutdown.
//!
//! Items go through a bounded work queue to a fixed pool of worker threads. Each worker
//! fetches an item's payload and decodes it into zero or more [`Record`]s. A single aggregator
//! folds the records into a [`ResultCollection`] keyed by [`Record::key`].

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod tasks;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::decoder::{EnvelopeDecoder, NdjsonDecoder, RecordDecoder};
pub use error::{DecodeError, FetchError, FragmentRef, PipelineError};
pub use pipeline::{PipelineRunner, PipelineState};
pub use source::{DirSource, FsFetcher, ItemFetcher, StaticSource, WorkSource};
pub use tasks::CancelToken;

/// Result alias used by public fanpipe API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: process `items` with `worker_count` workers and default options.
///
/// Returns an error only when the pipeline cannot start (e.g. `worker_count == 0`); failed
/// fetches and fragments are counted in the report. Use [`PipelineRunner`] for cancellation,
/// queue size, or duplicate-key policy.
///
/// ```ignore
/// let out = fanpipe::run(items, 4, fanpipe::FsFetcher::new(dir), fanpipe::NdjsonDecoder::default())?;
/// println!("{} records", out.collection.len());
/// ```
pub fn run<F, D>(
    items: Vec<WorkItem>,
    worker_count: usize,
    fetcher: F,
    decoder: D,
) -> std::result::Result<PipelineOutput, PipelineError>
where
    F: ItemFetcher + 'static,
    D: RecordDecoder + 'static,
{
    let opts = PipelineOpts {
        worker_count,
        ..PipelineOpts::default()
    };
    PipelineRunner::new(fetcher, decoder, opts).run(items)
}
