//! Aggregator: the single writer of the result collection.

use crossbeam_channel::Receiver;
use log::debug;
use std::collections::hash_map::Entry;

use crate::error::PipelineError;
use crate::tasks::{FutureAnswer, ask_named};
use crate::types::{DuplicatePolicy, Record, ResultCollection};
use crate::utils::config::PackagePaths;

/// The finished collection plus aggregation counts. Handed to the caller by value.
#[derive(Debug, Default)]
pub struct Aggregated {
    pub collection: ResultCollection,
    pub records_received: usize,
    pub duplicate_keys: usize,
}

impl Aggregated {
    /// Insert one record, resolving a key collision with `policy`.
    pub fn insert(&mut self, record: Record, policy: DuplicatePolicy) {
        self.records_received += 1;
        match self.collection.entry(record.key().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                self.duplicate_keys += 1;
                debug!("duplicate key {} ({:?})", slot.key(), policy);
                match policy {
                    DuplicatePolicy::Overwrite => {
                        slot.insert(record);
                    }
                    DuplicatePolicy::KeepFirst => {}
                    DuplicatePolicy::Merge => {
                        let merged = slot.get().merged_with(&record);
                        slot.insert(merged);
                    }
                }
            }
        }
    }
}

/// Drain `record_rx` until it is closed and empty.
pub fn aggregate_records(record_rx: Receiver<Record>, policy: DuplicatePolicy) -> Aggregated {
    let mut agg = Aggregated::default();
    while let Ok(record) = record_rx.recv() {
        agg.insert(record, policy);
    }
    debug!(
        "aggregator: result queue closed, {} records, {} keys",
        agg.records_received,
        agg.collection.len()
    );
    agg
}

/// Run [`aggregate_records`] on its own thread. The future resolves once the result queue
/// has been closed and drained; nothing else touches the collection before then.
pub fn spawn_aggregator(
    record_rx: Receiver<Record>,
    policy: DuplicatePolicy,
) -> Result<FutureAnswer<Aggregated>, PipelineError> {
    ask_named(PackagePaths::get().aggregator_thread_name(), move || {
        aggregate_records(record_rx, policy)
    })
    .map_err(|source| PipelineError::Spawn {
        what: "aggregator".to_string(),
        source,
    })
}
