use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, warn};
use std::any::Any;
use std::ops::AddAssign;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::PipelineError;
use crate::types::{Record, SkippedWork, WorkItem};
use crate::utils::config::PackagePaths;

use super::context::WorkerContext;

/// Per-worker counts, summed by [`WorkerPool::wait`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub items_attempted: usize,
    pub fetch_failures: usize,
    pub decode_failures: usize,
    /// Items whose fetch or decode panicked. The worker keeps going.
    pub panicked_items: usize,
    pub records_sent: usize,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.items_attempted += other.items_attempted;
        self.fetch_failures += other.fetch_failures;
        self.decode_failures += other.decode_failures;
        self.panicked_items += other.panicked_items;
        self.records_sent += other.records_sent;
    }
}

/// Fetch one item, decode its payload and push every good record. Failures are reported and skipped.
fn process_item(
    item: &WorkItem,
    record_tx: &Sender<Record>,
    ctx: &WorkerContext,
    stats: &mut WorkerStats,
) {
    let payload = match ctx.fetcher.fetch(item) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("fetch failed for {}: {}", item, err);
            stats.fetch_failures += 1;
            ctx.record_skip(SkippedWork::Item {
                item: item.clone(),
                reason: err.to_string(),
            });
            return;
        }
    };

    for decoded in ctx.decoder.decode(&payload) {
        match decoded {
            Ok(record) => {
                if record_tx.send(record).is_err() {
                    error!("result queue closed while {} was in flight", item);
                    return;
                }
                stats.records_sent += 1;
            }
            Err(err) => {
                warn!("decode failed for {}: {}", item, err);
                stats.decode_failures += 1;
                let at = err.fragment();
                ctx.record_skip(SkippedWork::Fragment {
                    item: item.clone(),
                    fragment: at.index,
                    offset: at.offset,
                    reason: err.reason(),
                });
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Single worker: pull items until the work queue is closed and drained, or cancellation is seen.
fn worker_loop(
    id: usize,
    work_rx: Receiver<WorkItem>,
    record_tx: Sender<Record>,
    ctx: WorkerContext,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    while let Ok(item) = work_rx.recv() {
        if ctx.cancel.is_cancelled() {
            debug!("worker {}: cancelled, leaving {} unprocessed", id, item);
            break;
        }
        stats.items_attempted += 1;
        let processed = panic::catch_unwind(AssertUnwindSafe(|| {
            process_item(&item, &record_tx, &ctx, &mut stats)
        }));
        if let Err(payload) = processed {
            let reason = format!("panicked: {}", panic_message(payload.as_ref()));
            error!("processing {} {}", item, reason);
            stats.panicked_items += 1;
            ctx.record_skip(SkippedWork::Item {
                item: item.clone(),
                reason,
            });
        }
        if let Some(cb) = &ctx.on_item_done {
            cb(&item);
        }
    }
    drop(record_tx);
    debug!(
        "worker {}: exiting after {} items, {} records",
        id, stats.items_attempted, stats.records_sent
    );
    stats
}

/// Fixed set of worker threads sharing one work queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            handles: Vec::with_capacity(n),
        }
    }

    /// Start `n` workers pulling from `work_rx` and pushing to clones of `record_tx`.
    ///
    /// On a spawn failure the workers already started stay in the pool: close the work queue,
    /// then [`wait`](Self::wait) to reap them.
    pub fn start(
        &mut self,
        n: usize,
        work_rx: Receiver<WorkItem>,
        record_tx: &Sender<Record>,
        ctx: &WorkerContext,
    ) -> Result<(), PipelineError> {
        if n == 0 {
            return Err(PipelineError::InvalidWorkerCount);
        }
        let paths = PackagePaths::get();
        for id in 0..n {
            let work_rx = work_rx.clone();
            let record_tx = record_tx.clone();
            let ctx = ctx.clone();
            let handle = thread::Builder::new()
                .name(paths.worker_thread_name(id))
                .spawn(move || worker_loop(id, work_rx, record_tx, ctx))
                .map_err(|source| PipelineError::Spawn {
                    what: format!("worker {id}"),
                    source,
                })?;
            self.handles.push(handle);
        }
        debug!("started {} workers", n);
        Ok(())
    }

    /// Number of workers started.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Block until every worker has exited; returns their summed stats.
    /// A panicked worker is logged and contributes nothing.
    pub fn wait(self) -> WorkerStats {
        let mut total = WorkerStats::default();
        for (id, h) in self.handles.into_iter().enumerate() {
            match h.join() {
                Ok(stats) => total += stats,
                Err(_) => error!("worker {} panicked; its counts are lost", id),
            }
        }
        total
    }
}
