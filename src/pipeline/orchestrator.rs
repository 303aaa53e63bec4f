use log::debug;
use std::sync::Arc;

use crate::engine::decoder::RecordDecoder;
use crate::error::PipelineError;
use crate::source::{ItemFetcher, WorkSource};
use crate::types::{PipelineOpts, PipelineOutput, RunReport, WorkItem};

use super::aggregate::spawn_aggregator;
use super::context::{WorkerContext, create_pipeline_channels};
use super::dispatch::dispatch;
use super::error_handler::report_run_summary;
use super::state::PipelineState;
use super::workers::WorkerPool;

/// Runs the fan-out/fan-in pipeline: dispatcher → bounded queue → N workers → unbounded
/// queue → aggregator. Reusable; every run gets fresh queues and threads.
pub struct PipelineRunner {
    fetcher: Arc<dyn ItemFetcher>,
    decoder: Arc<dyn RecordDecoder>,
    opts: PipelineOpts,
}

impl PipelineRunner {
    pub fn new<F, D>(fetcher: F, decoder: D, opts: PipelineOpts) -> Self
    where
        F: ItemFetcher + 'static,
        D: RecordDecoder + 'static,
    {
        Self::from_shared(Arc::new(fetcher), Arc::new(decoder), opts)
    }

    pub fn from_shared(
        fetcher: Arc<dyn ItemFetcher>,
        decoder: Arc<dyn RecordDecoder>,
        opts: PipelineOpts,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            opts,
        }
    }

    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// List `source`, then [`run`](Self::run). A listing failure aborts before any dispatch.
    pub fn run_source(&self, source: &dyn WorkSource) -> Result<PipelineOutput, PipelineError> {
        let items = source.list().map_err(PipelineError::Source)?;
        self.run(items)
    }

    /// Process every item and return the finished collection.
    ///
    /// Per-item and per-fragment failures are reported in the [`RunReport`], never returned.
    /// Errors mean the pipeline never started dispatching.
    pub fn run(&self, items: Vec<WorkItem>) -> Result<PipelineOutput, PipelineError> {
        let opts = &self.opts;
        if opts.worker_count == 0 {
            return Err(PipelineError::InvalidWorkerCount);
        }
        if opts.queue_capacity == 0 {
            return Err(PipelineError::InvalidQueueCapacity);
        }
        debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

        let mut state = PipelineState::Idle;
        let items_total = items.len();
        let cancel = opts.cancel.clone().unwrap_or_default();
        let channels = create_pipeline_channels(opts.queue_capacity);
        let mut ctx = WorkerContext::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.decoder),
            cancel.clone(),
        );
        ctx.on_item_done = opts.on_item_done.clone();

        let aggregator = spawn_aggregator(channels.record_rx, opts.duplicate_policy)?;
        let mut pool = WorkerPool::with_capacity(opts.worker_count);
        if let Err(err) = pool.start(
            opts.worker_count,
            channels.work_rx,
            &channels.record_tx,
            &ctx,
        ) {
            // Unwind whatever started: close both queues in order and reap the threads.
            drop(channels.work_tx);
            pool.wait();
            drop(channels.record_tx);
            let _ = aggregator.wait();
            return Err(err);
        }

        state.advance();
        let items_dispatched = dispatch(items, channels.work_tx, &cancel);

        state.advance();
        let stats = pool.wait();
        // Every worker has exited, so no record can still be in flight.
        drop(channels.record_tx);

        state.advance();
        let aggregated = aggregator
            .wait()
            .map_err(|_| PipelineError::AggregatorLost)?;

        state.advance();
        let report = RunReport {
            items_total,
            items_dispatched,
            items_attempted: stats.items_attempted,
            fetch_failures: stats.fetch_failures,
            decode_failures: stats.decode_failures,
            panicked_items: stats.panicked_items,
            records_produced: aggregated.records_received,
            duplicate_keys: aggregated.duplicate_keys,
            skipped: ctx.take_skipped(),
            cancelled: cancel.is_cancelled(),
        };
        report_run_summary(&report, aggregated.collection.len());

        Ok(PipelineOutput {
            collection: aggregated.collection,
            report,
        })
    }
}
