//! Pipeline context: the two queues and the shared state handed to every worker.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::decoder::RecordDecoder;
use crate::source::ItemFetcher;
use crate::tasks::CancelToken;
use crate::types::{ItemCallback, Record, SkippedWork, WorkItem};

/// Work queue (bounded, applies backpressure to dispatch) and result queue (unbounded, so
/// workers never block on the aggregator).
pub struct PipelineChannels {
    pub work_tx: Sender<WorkItem>,
    pub work_rx: Receiver<WorkItem>,
    pub record_tx: Sender<Record>,
    pub record_rx: Receiver<Record>,
}

pub fn create_pipeline_channels(queue_capacity: usize) -> PipelineChannels {
    let (work_tx, work_rx) = bounded::<WorkItem>(queue_capacity);
    let (record_tx, record_rx) = unbounded::<Record>();
    PipelineChannels {
        work_tx,
        work_rx,
        record_tx,
        record_rx,
    }
}

/// Append-only list of reported failures. Written by workers, read once after they exit.
pub type SkippedList = Arc<Mutex<Vec<SkippedWork>>>;

/// Shared, read-only (apart from `skipped`) context cloned into every worker thread.
#[derive(Clone)]
pub struct WorkerContext {
    pub fetcher: Arc<dyn ItemFetcher>,
    pub decoder: Arc<dyn RecordDecoder>,
    pub cancel: CancelToken,
    pub skipped: SkippedList,
    pub on_item_done: Option<ItemCallback>,
}

impl WorkerContext {
    pub fn new(
        fetcher: Arc<dyn ItemFetcher>,
        decoder: Arc<dyn RecordDecoder>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            cancel,
            skipped: Arc::new(Mutex::new(Vec::new())),
            on_item_done: None,
        }
    }

    pub fn record_skip(&self, skipped: SkippedWork) {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(skipped);
    }

    /// Take everything reported so far. Call after the workers have exited.
    pub fn take_skipped(&self) -> Vec<SkippedWork> {
        std::mem::take(&mut *self.skipped.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
